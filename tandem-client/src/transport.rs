use crate::error::TransportError;
use crate::media::{MediaStream, MediaTrack};
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::SessionBlob;
use tokio::sync::mpsc;

/// Asynchronous notifications surfaced by a transport endpoint.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The endpoint wants a fresh offer/answer round (e.g. a track was
    /// added after the initial handshake).
    NegotiationNeeded,
    /// An inbound media stream became available.
    Track(MediaStream),
    /// A local ICE candidate is ready to be relayed to the peer.
    CandidateGenerated(String),
    /// The underlying connection dropped or failed.
    Disconnected,
}

/// The media-transport collaborator contract. The negotiation machine
/// drives this interface and never reaches below it; offer/answer blobs
/// are opaque to everything above the endpoint.
#[async_trait]
pub trait TransportEndpoint: Send + Sync {
    async fn create_offer(&self) -> Result<SessionBlob, TransportError>;

    /// Applies the remote offer and produces the local answer.
    async fn create_answer(&self, offer: &SessionBlob) -> Result<SessionBlob, TransportError>;

    async fn set_remote_description(&self, desc: &SessionBlob) -> Result<(), TransportError>;

    /// Binds a local track. Returns `false` when the track was already
    /// bound; re-adding must never produce a duplicate send.
    async fn add_track(&self, track: &MediaTrack, stream_id: &str) -> Result<bool, TransportError>;

    async fn add_ice_candidate(&self, candidate: &str) -> Result<(), TransportError>;

    async fn close(&self);
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Creates an endpoint whose events arrive on `events`.
    async fn create_endpoint(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn TransportEndpoint>, TransportError>;
}
