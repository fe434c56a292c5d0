use async_trait::async_trait;
use ulid::Ulid;

use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Write would overlap the given existing reservation.
    Conflict(ReservationNumber),
    NotFound(ReservationNumber),
    RoomNotFound(Ulid),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Conflict(number) => write!(f, "conflict with reservation: {number}"),
            StoreError::NotFound(number) => write!(f, "reservation not found: {number}"),
            StoreError::RoomNotFound(id) => write!(f, "room not found: {id}"),
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            StoreError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence contract the scheduler depends on.
///
/// `insert` and `update` are the last line of defense against write races:
/// an implementation must reject, atomically, any write whose stay overlaps
/// (inclusive on both ends) another reservation of the same room.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn list_reservations_for_room(&self, room_id: Ulid) -> Result<Vec<Reservation>, StoreError>;

    async fn get_by_number(&self, number: ReservationNumber) -> Result<Option<Reservation>, StoreError>;

    /// The room the scheduler operates against: the first one ever created.
    async fn singleton_room(&self) -> Result<Option<Room>, StoreError>;

    /// Assigns identity and the next reservation number.
    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, StoreError>;

    async fn update(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn remove(&self, reservation: &Reservation) -> Result<(), StoreError>;
}
