mod room;
mod room_directory;

pub use room::{Room, Seat};
pub use room_directory::{Departure, JoinError, JoinOutcome, RoomDirectory};
