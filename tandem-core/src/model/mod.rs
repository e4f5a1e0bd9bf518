mod participant;
mod session_blob;
mod signal;

pub use participant::{ParseParticipantIdError, ParticipantId};
pub use session_blob::SessionBlob;
pub use signal::{ClientSignal, ServerSignal};
