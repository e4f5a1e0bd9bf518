use async_trait::async_trait;
use tandem_core::{ParticipantId, ServerSignal};

/// Delivery side of the relay: hands a signal to one connected client.
///
/// Implemented by the WebSocket service in production and by a capturing
/// mock in tests. Delivery to an unknown identity is not an error; the
/// signal is simply dropped.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn deliver(&self, to: ParticipantId, signal: ServerSignal);
}
