pub mod room;
pub mod signaling;

pub use room::{Departure, JoinError, JoinOutcome, RoomDirectory};
pub use signaling::{AppState, Relay, SignalingOutput, SignalingService, ws_handler};
