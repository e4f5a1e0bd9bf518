use crate::room::{JoinError, JoinOutcome, RoomDirectory};
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use tandem_core::{ClientSignal, ParticipantId, ServerSignal};
use tracing::{debug, info, warn};

/// The relay's single dispatch entry point: every inbound client signal
/// lands in [`Relay::handle`], which mutates the room directory and emits
/// outbound signals through the [`SignalingOutput`].
///
/// Addressed signals are forwarded by identity lookup only; payloads are
/// never interpreted. The `from` stamped onto a forwarded signal is always
/// the sender's connection identity, never anything out of the payload.
pub struct Relay {
    directory: Arc<RoomDirectory>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(directory: Arc<RoomDirectory>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self { directory, signaling }
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub async fn handle(&self, from: ParticipantId, signal: ClientSignal) {
        match signal {
            ClientSignal::Join { email, room } => self.handle_join(from, email, room).await,
            ClientSignal::Leave {} => self.handle_leave(&from).await,

            ClientSignal::Call { to, offer } => {
                self.forward(&from, to, ServerSignal::IncomingCall { from: from.clone(), offer })
                    .await;
            }
            ClientSignal::Accept { to, ans } => {
                self.forward(&from, to, ServerSignal::CallAccepted { from: from.clone(), ans })
                    .await;
            }
            ClientSignal::Busy { to } => {
                self.forward(&from, to, ServerSignal::CallBusy { from: from.clone() })
                    .await;
            }
            ClientSignal::NegoOffer { to, offer } => {
                self.forward(&from, to, ServerSignal::NegoOffer { from: from.clone(), offer })
                    .await;
            }
            ClientSignal::NegoAnswer { to, ans } => {
                self.forward(&from, to, ServerSignal::NegoAnswer { from: from.clone(), ans })
                    .await;
            }
            ClientSignal::IceCandidate { to, candidate } => {
                self.forward(
                    &from,
                    to,
                    ServerSignal::IceCandidate { from: from.clone(), candidate },
                )
                .await;
            }
        }
    }

    /// Connection teardown: same as an explicit leave.
    pub async fn disconnect(&self, id: ParticipantId) {
        self.handle_leave(&id).await;
    }

    async fn handle_join(&self, from: ParticipantId, email: String, room: String) {
        match self.directory.join(from.clone(), email.clone(), &room) {
            Ok(JoinOutcome::Waiting) => {
                info!("Participant {} is waiting in room '{}'", from, room);
                self.signaling
                    .deliver(from, ServerSignal::Joined { room })
                    .await;
            }
            Ok(JoinOutcome::Paired { other_id, .. }) => {
                info!("Participant {} paired with {} in room '{}'", from, other_id, room);
                self.signaling
                    .deliver(
                        other_id,
                        ServerSignal::UserJoined { email, id: from.clone() },
                    )
                    .await;
                self.signaling
                    .deliver(from, ServerSignal::Joined { room })
                    .await;
            }
            Err(JoinError::RoomFull { room }) => {
                warn!("Join rejected, room '{}' is full", room);
                self.signaling
                    .deliver(from, ServerSignal::RoomFull { room })
                    .await;
            }
            Err(e @ JoinError::AlreadyJoined { .. }) => {
                warn!("Join rejected for {}: {}", from, e);
            }
        }
    }

    async fn handle_leave(&self, id: &ParticipantId) {
        let Some(departure) = self.directory.leave(id) else {
            return;
        };
        if let Some(remaining) = departure.remaining {
            self.signaling
                .deliver(remaining, ServerSignal::PeerLeft { id: id.clone() })
                .await;
        }
    }

    /// Lookup-and-forward. Signals addressed to an identity that is no
    /// longer seated anywhere are stale and dropped without effect.
    async fn forward(&self, from: &ParticipantId, to: ParticipantId, signal: ServerSignal) {
        if self.directory.member_room(&to).is_none() {
            debug!("Dropping stale signal from {} to departed {}", from, to);
            return;
        }
        self.signaling.deliver(to, signal).await;
    }
}
