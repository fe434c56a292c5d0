use crate::model::ReservationNumber;

use super::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    InvalidDate,
    EndBeforeStart,
    PastDate,
    TooLong { nights: i64, max: i64 },
    TooFarInAdvance { horizon_days: i64 },
    InvalidName(&'static str),
    RoomUnavailable,
    NotFound(ReservationNumber),
    NoRoom,
    StorageError(String),
}

impl SchedulerError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulerError::InvalidDate => "invalid_date",
            SchedulerError::EndBeforeStart => "end_before_start",
            SchedulerError::PastDate => "past_date",
            SchedulerError::TooLong { .. } => "too_long",
            SchedulerError::TooFarInAdvance { .. } => "too_far_in_advance",
            SchedulerError::InvalidName(_) => "invalid_name",
            SchedulerError::RoomUnavailable => "room_unavailable",
            SchedulerError::NotFound(_) => "not_found",
            SchedulerError::NoRoom => "no_room",
            SchedulerError::StorageError(_) => "storage_error",
        }
    }
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidDate => {
                write!(f, "start and end must be valid dates (dd/mm/yyyy)")
            }
            SchedulerError::EndBeforeStart => write!(f, "end date is before start date"),
            SchedulerError::PastDate => write!(f, "reservations cannot start in the past"),
            SchedulerError::TooLong { nights, max } => {
                write!(f, "stay of {nights} days exceeds the maximum of {max} days")
            }
            SchedulerError::TooFarInAdvance { horizon_days } => write!(
                f,
                "reservations can only be made up to {horizon_days} days in advance"
            ),
            SchedulerError::InvalidName(msg) => write!(f, "invalid name: {msg}"),
            SchedulerError::RoomUnavailable => write!(f, "room is not available on those dates"),
            SchedulerError::NotFound(number) => write!(f, "reservation {number} not found"),
            SchedulerError::NoRoom => write!(f, "no room is configured"),
            SchedulerError::StorageError(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<StoreError> for SchedulerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => SchedulerError::RoomUnavailable,
            StoreError::NotFound(number) => SchedulerError::NotFound(number),
            other => {
                tracing::error!("store failure: {other}");
                SchedulerError::StorageError(other.to_string())
            }
        }
    }
}
