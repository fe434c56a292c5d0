use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::store::StoreError;

/// Inclusive-inclusive overlap between a stored stay and a raw candidate range.
fn collides(existing: &Stay, start: NaiveDate, end: NaiveDate) -> bool {
    existing.start <= end && existing.end >= start
}

/// First reservation of `room_id` that collides with `[start, end]`,
/// skipping the reservation numbered `exclude`.
pub fn first_conflict(
    room_id: Ulid,
    start: NaiveDate,
    end: NaiveDate,
    existing: &[Reservation],
    exclude: Option<ReservationNumber>,
) -> Option<&Reservation> {
    existing.iter().find(|r| {
        r.room_id == room_id
            && exclude != Some(r.number)
            && collides(&r.stay, start, end)
    })
}

pub fn is_available(
    room_id: Ulid,
    start: NaiveDate,
    end: NaiveDate,
    existing: &[Reservation],
    exclude: Option<ReservationNumber>,
) -> bool {
    first_conflict(room_id, start, end, existing, exclude).is_none()
}

/// Store-side uniqueness check. Caller holds the room's write lock.
pub fn check_no_conflict(
    rs: &RoomState,
    stay: &Stay,
    exclude: Option<ReservationNumber>,
) -> Result<(), StoreError> {
    for r in rs.overlapping(stay) {
        if exclude != Some(r.number) {
            return Err(StoreError::Conflict(r.number));
        }
    }
    Ok(())
}
