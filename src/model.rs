use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Externally visible reservation identifier, assigned once at creation.
pub type ReservationNumber = u32;

/// Inclusive calendar-date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stay {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Stay {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "Stay start must not be after end");
        Self { start, end }
    }

    /// Days between start and end; a one-day stay has zero nights.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Inclusive on both ends: touching stays conflict.
    pub fn overlaps(&self, other: &Stay) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub name: String,
    pub beds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub number: ReservationNumber,
    pub room_id: Ulid,
    pub name: String,
    pub stay: Stay,
}

/// A reservation before the store has assigned its identity and number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub room_id: Ulid,
    pub name: String,
    pub stay: Stay,
}

#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// All reservations of this room, sorted by `stay.start`.
    pub reservations: Vec<Reservation>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            reservations: Vec::new(),
        }
    }

    /// Insert reservation maintaining sort order by stay.start.
    pub fn insert_reservation(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.stay.start, |r| r.stay.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub fn remove_reservation(&mut self, number: ReservationNumber) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.number == number)?;
        Some(self.reservations.remove(pos))
    }

    pub fn get(&self, number: ReservationNumber) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.number == number)
    }

    /// Return only reservations whose stay overlaps the query (inclusive).
    /// Uses binary search to skip reservations starting after `query.end`.
    pub fn overlapping(&self, query: &Stay) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.stay.start <= query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.stay.overlaps(query))
    }
}

/// Write-ahead log record. Flat, no nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: Ulid,
        name: String,
        beds: u32,
    },
    ReservationCreated {
        reservation: Reservation,
    },
    ReservationUpdated {
        reservation: Reservation,
    },
    ReservationCancelled {
        room_id: Ulid,
        number: ReservationNumber,
    },
    /// Written by compaction so numbers of cancelled reservations stay retired.
    NumbersReserved {
        next: ReservationNumber,
    },
}
