use crate::room::{Room, Seat};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tandem_core::ParticipantId;
use tracing::{debug, info};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// First seat taken; waiting for a second participant.
    Waiting,
    /// Second seat taken; the room is now a pair.
    Paired {
        other_id: ParticipantId,
        other_email: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum JoinError {
    #[error("room '{room}' already has two participants")]
    RoomFull { room: String },
    #[error("participant is already seated in room '{room}'")]
    AlreadyJoined { room: String },
}

/// Reported by `leave` so the relay can notify whoever is left behind.
#[derive(Debug, Clone)]
pub struct Departure {
    pub room: String,
    pub remaining: Option<ParticipantId>,
}

/// Maps room names to their (at most two) occupants, plus a reverse index
/// from participant to room for O(1) leave and stale-route checks.
///
/// Rooms are created lazily on first join and removed when the last seat
/// empties. Racing joins to the same room serialize on the map's entry
/// lock, so "first" vs "second" seat is always decided deterministically.
pub struct RoomDirectory {
    rooms: DashMap<String, Room>,
    occupants: DashMap<ParticipantId, String>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            occupants: DashMap::new(),
        }
    }

    /// Seats `id` in `room`.
    ///
    /// Re-joining the room one is already seated in is idempotent and
    /// reports the current pairing state; joining a different room while
    /// seated is an error (leave first).
    pub fn join(
        &self,
        id: ParticipantId,
        email: String,
        room: &str,
    ) -> Result<JoinOutcome, JoinError> {
        if let Some(current) = self.occupants.get(&id) {
            if current.value() == room {
                drop(current);
                return Ok(self.pairing_state(&id, room));
            }
            return Err(JoinError::AlreadyJoined {
                room: current.value().clone(),
            });
        }

        match self.rooms.entry(room.to_string()) {
            Entry::Vacant(slot) => {
                info!("Creating room '{}'", room);
                let mut fresh = Room::new();
                fresh.occupy(Seat { id: id.clone(), email });
                slot.insert(fresh);
                self.occupants.insert(id, room.to_string());
                Ok(JoinOutcome::Waiting)
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.is_full() {
                    return Err(JoinError::RoomFull { room: room.to_string() });
                }
                let other = existing.seats()[0].clone();
                existing.occupy(Seat { id: id.clone(), email });
                self.occupants.insert(id, room.to_string());
                Ok(JoinOutcome::Paired {
                    other_id: other.id,
                    other_email: other.email,
                })
            }
        }
    }

    /// Vacates whatever seat `id` holds. Deletes the room once empty.
    pub fn leave(&self, id: &ParticipantId) -> Option<Departure> {
        let (_, room_name) = self.occupants.remove(id)?;

        let (remaining, now_empty) = {
            let mut room = self.rooms.get_mut(&room_name)?;
            room.vacate(id);
            (room.other_seat(id).map(|s| s.id.clone()), room.is_empty())
        };

        if now_empty {
            info!("Room '{}' is empty, removing", room_name);
            self.rooms.remove(&room_name);
        } else {
            debug!("Participant {} left room '{}'", id, room_name);
        }

        Some(Departure { room: room_name, remaining })
    }

    /// The room `id` is currently seated in, if any.
    pub fn member_room(&self, id: &ParticipantId) -> Option<String> {
        self.occupants.get(id).map(|r| r.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |r| r.seats().len())
    }

    fn pairing_state(&self, id: &ParticipantId, room: &str) -> JoinOutcome {
        let other = self
            .rooms
            .get(room)
            .and_then(|r| r.other_seat(id).cloned());
        match other {
            Some(seat) => JoinOutcome::Paired {
                other_id: seat.id,
                other_email: seat.email,
            },
            None => JoinOutcome::Waiting,
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
