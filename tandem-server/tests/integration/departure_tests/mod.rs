mod test_peer_left;
