pub mod departure_tests;

use std::sync::Arc;
use tandem_core::{ClientSignal, ParticipantId};
use tandem_server::{Relay, RoomDirectory};

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_relay() -> (Relay, MockSignalingOutput, Arc<RoomDirectory>) {
    let directory = Arc::new(RoomDirectory::new());
    let mock = MockSignalingOutput::new();
    let relay = Relay::new(directory.clone(), Arc::new(mock.clone()));
    (relay, mock, directory)
}

/// Joins `id` to `room` with a generated email.
pub async fn join(relay: &Relay, id: &ParticipantId, room: &str) {
    relay
        .handle(
            id.clone(),
            ClientSignal::Join {
                email: format!("{id}@test"),
                room: room.to_string(),
            },
        )
        .await;
}
