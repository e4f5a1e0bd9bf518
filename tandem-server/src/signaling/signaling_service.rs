use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ParticipantId, ServerSignal};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Registry of connected clients and their outbound WebSocket channels.
#[derive(Clone)]
pub struct SignalingService {
    peers: Arc<DashMap<ParticipantId, mpsc::UnboundedSender<Message>>>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self { peers: Arc::new(DashMap::new()) }
    }

    pub fn add_peer(&self, id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(id, tx);
    }

    pub fn remove_peer(&self, id: &ParticipantId) {
        self.peers.remove(id);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn send_signal(&self, id: &ParticipantId, signal: &ServerSignal) {
        let Some(peer) = self.peers.get(id) else {
            warn!("Attempted to send signal to disconnected participant {}", id);
            return;
        };
        match serde_json::to_string(signal) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to queue WS message for {}: {:?}", id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal: {}", e),
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, to: ParticipantId, signal: ServerSignal) {
        self.send_signal(&to, &signal);
    }
}
