use crate::integration::{connect_call, paired_peers};
use crate::utils::pump;
use tandem_client::{MediaTrack, Phase, TrackKind, TransportEvent};

#[tokio::test]
async fn mid_call_renegotiation_returns_both_sides_to_connected() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let descriptions_before = b.endpoint().remote_descriptions().len();

    // The transport noticed a change (e.g. a track added post-handshake).
    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;
    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Renegotiating));

    // Offer → answer → applied, all through the relay.
    pump(&mut a, &mut b).await;

    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Connected));
    assert_eq!(b.client.phase_of(&a.id), Some(Phase::Connected));
    assert_eq!(b.endpoint().remote_descriptions().len(), descriptions_before + 1);
}

#[tokio::test]
async fn answer_application_lands_connected_after_repeated_renegotiations() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    for _ in 0..5 {
        a.client
            .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
            .await;
        pump(&mut a, &mut b).await;
        assert_eq!(a.client.phase_of(&b.id), Some(Phase::Connected));
        assert_eq!(b.client.phase_of(&a.id), Some(Phase::Connected));
    }
}

#[tokio::test]
async fn negotiation_needed_is_coalesced_while_one_is_in_flight() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let offers_before = a.endpoint().offers_created();

    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;
    // Second trigger before the answer comes back.
    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;

    assert_eq!(a.endpoint().offers_created(), offers_before + 1);

    pump(&mut a, &mut b).await;
    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Connected));
}

#[tokio::test]
async fn sharing_streams_again_does_not_duplicate_tracks() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    let bound = a.endpoint().bound_count();

    a.client.share_streams().await.expect("share");
    a.client.share_streams().await.expect("share again");

    assert_eq!(a.endpoint().bound_count(), bound);
    assert_eq!(a.client.bound_track_count_of(&b.id), Some(bound));
}

#[tokio::test]
async fn screen_share_track_reaches_the_peer() {
    let (_loopback, mut a, mut b) = paired_peers("42").await;
    connect_call(&mut a, &mut b).await;

    // A new capture track appears mid-call on a's side.
    let mut stream = a.client.local_stream_of(&b.id).expect("stream").clone();
    stream.push_track(MediaTrack::new("a-screen-0", TrackKind::Video));
    a.client
        .handle_transport_event(b.id.clone(), TransportEvent::NegotiationNeeded)
        .await;
    pump(&mut a, &mut b).await;

    // Renegotiation settled, both stay connected with media intact.
    assert_eq!(a.client.phase_of(&b.id), Some(Phase::Connected));
    assert_eq!(b.client.phase_of(&a.id), Some(Phase::Connected));

    // The peer sees the refreshed stream by track identity.
    b.client
        .handle_transport_event(a.id.clone(), TransportEvent::Track(stream.clone()))
        .await;
    let seen = b.client.remote_stream_of(&a.id).expect("remote stream");
    assert!(seen.tracks().iter().any(|t| t.id() == "a-screen-0"));
}
