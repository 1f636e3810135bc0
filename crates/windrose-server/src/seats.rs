//! Seat management: which civ is driven by which connection.
//!
//! The transport itself is out of scope; a connected player is anything
//! with a `send(String)` sink. AI seats have no sink — messages addressed
//! to them are dropped silently. A disconnect converts the seat to AI; the
//! civ keeps existing and keeps being ticked.

use std::fmt;

use thiserror::Error;
use tracing::debug;
use windrose_protocol::CivId;

/// Outbound message sink for one connected player.
pub trait ClientSink: Send {
    fn send(&mut self, message: &str);
}

/// A `Vec<String>` collects messages, which is all the tests need.
impl ClientSink for Vec<String> {
    fn send(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

pub enum SeatState {
    Human(Box<dyn ClientSink>),
    Ai,
}

impl fmt::Debug for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatState::Human(_) => f.write_str("Human"),
            SeatState::Ai => f.write_str("Ai"),
        }
    }
}

#[derive(Debug)]
pub struct Seat {
    pub civ: CivId,
    pub name: String,
    pub state: SeatState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("game is full")]
    GameFull,
}

/// The seat table. Seat order is civ order; a civ's id is its index.
#[derive(Debug, Default)]
pub struct SeatTable {
    seats: Vec<Seat>,
}

impl SeatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn civs(&self) -> impl Iterator<Item = CivId> + '_ {
        self.seats.iter().map(|seat| seat.civ)
    }

    pub fn add_human(
        &mut self,
        name: String,
        sink: Box<dyn ClientSink>,
        max_seats: u8,
    ) -> Result<CivId, JoinError> {
        self.add_seat(name, SeatState::Human(sink), max_seats)
    }

    pub fn add_ai(&mut self, name: String, max_seats: u8) -> Result<CivId, JoinError> {
        self.add_seat(name, SeatState::Ai, max_seats)
    }

    fn add_seat(
        &mut self,
        name: String,
        state: SeatState,
        max_seats: u8,
    ) -> Result<CivId, JoinError> {
        if self.seats.len() >= max_seats as usize {
            return Err(JoinError::GameFull);
        }
        let civ = CivId(self.seats.len() as u8);
        self.seats.push(Seat { civ, name, state });
        Ok(civ)
    }

    pub fn name_of(&self, civ: CivId) -> Option<&str> {
        self.seats.get(civ.index()).map(|seat| seat.name.as_str())
    }

    pub fn is_human(&self, civ: CivId) -> bool {
        matches!(
            self.seats.get(civ.index()).map(|seat| &seat.state),
            Some(SeatState::Human(_))
        )
    }

    pub fn human_civs(&self) -> Vec<CivId> {
        self.seats
            .iter()
            .filter(|seat| matches!(seat.state, SeatState::Human(_)))
            .map(|seat| seat.civ)
            .collect()
    }

    /// Convert a seat to AI. The simulation is unaffected; the seat simply
    /// stops receiving messages.
    pub fn disconnect(&mut self, civ: CivId) {
        if let Some(seat) = self.seats.get_mut(civ.index()) {
            if matches!(seat.state, SeatState::Human(_)) {
                debug!(civ = civ.0, name = %seat.name, "seat converted to AI");
                seat.state = SeatState::Ai;
            }
        }
    }

    /// Deliver a message to a seat. AI seats swallow it; a missing seat is
    /// reported as `false` so the caller can log it.
    pub fn send_to(&mut self, civ: CivId, message: &str) -> bool {
        match self.seats.get_mut(civ.index()) {
            Some(Seat {
                state: SeatState::Human(sink),
                ..
            }) => {
                sink.send(message);
                true
            }
            Some(_) => true, // AI: dropped silently
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<String>>>);

    impl ClientSink for SharedSink {
        fn send(&mut self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn seats_fill_in_civ_order_until_capacity() {
        let mut seats = SeatTable::new();
        assert_eq!(seats.add_ai("a".into(), 2), Ok(CivId(0)));
        assert_eq!(seats.add_ai("b".into(), 2), Ok(CivId(1)));
        assert_eq!(seats.add_ai("c".into(), 2), Err(JoinError::GameFull));
    }

    #[test]
    fn disconnect_turns_a_seat_into_ai() {
        let sink = SharedSink::default();
        let mut seats = SeatTable::new();
        let civ = seats
            .add_human("alice".into(), Box::new(sink.clone()), 4)
            .unwrap();
        assert!(seats.is_human(civ));

        assert!(seats.send_to(civ, "hello"));
        seats.disconnect(civ);
        assert!(!seats.is_human(civ));

        // Messages to the AI seat are swallowed, not errors.
        assert!(seats.send_to(civ, "dropped"));
        assert_eq!(sink.0.lock().unwrap().as_slice(), &["hello".to_string()]);
    }

    #[test]
    fn missing_seat_is_reported() {
        let mut seats = SeatTable::new();
        assert!(!seats.send_to(CivId(5), "nobody"));
    }
}
