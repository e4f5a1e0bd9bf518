pub mod model;

pub use model::{ClientSignal, ParticipantId, ServerSignal, SessionBlob};
