use tandem_core::ParticipantId;

/// One occupied seat in a room.
#[derive(Debug, Clone)]
pub struct Seat {
    pub id: ParticipantId,
    pub email: String,
}

/// A short-lived pairing context for one call: up to two seats, in join
/// order. Created lazily on first join, removed when the last seat empties.
#[derive(Debug, Default)]
pub struct Room {
    seats: Vec<Seat>,
}

impl Room {
    pub const CAPACITY: usize = 2;

    pub fn new() -> Self {
        Self { seats: Vec::with_capacity(Self::CAPACITY) }
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= Self::CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat_of(&self, id: &ParticipantId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.id == id)
    }

    /// The seat held by anyone other than `id`, if occupied.
    pub fn other_seat(&self, id: &ParticipantId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.id != id)
    }

    /// Occupies a seat. Caller checks `is_full` first; a push past capacity
    /// is a directory bug.
    pub(crate) fn occupy(&mut self, seat: Seat) {
        debug_assert!(!self.is_full());
        self.seats.push(seat);
    }

    /// Vacates the seat held by `id`, returning it.
    pub(crate) fn vacate(&mut self, id: &ParticipantId) -> Option<Seat> {
        let pos = self.seats.iter().position(|s| &s.id == id)?;
        Some(self.seats.remove(pos))
    }
}
