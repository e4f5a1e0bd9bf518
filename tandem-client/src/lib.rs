pub mod client;
pub mod error;
pub mod media;
pub mod session;
pub mod transport;

pub use client::{CallClient, CallEvent, SignalSink};
pub use error::{MediaError, SessionError, TransportError};
pub use media::{MediaConstraints, MediaSource, MediaStream, MediaTrack, TrackKind};
pub use session::{NegotiationSession, Phase};
pub use transport::{TransportEndpoint, TransportEvent, TransportFactory};
