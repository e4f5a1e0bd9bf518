use crate::session::Phase;

/// Local media capture failures. Surfaced to the user; the call attempt is
/// aborted and the session returns to idle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaError {
    #[error("media permission denied")]
    PermissionDenied,
    #[error("media device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Failures reported by the media-transport collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("transport operation failed: {0}")]
    Failed(String),
    #[error("transport endpoint is closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("no remote peer known yet")]
    NoRemotePeer,
    #[error("an offer is already outstanding for this session")]
    OfferOutstanding,
    #[error("operation not valid in phase {phase:?}")]
    InvalidPhase { phase: Phase },
}
