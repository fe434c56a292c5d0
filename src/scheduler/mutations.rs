use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::*;
use crate::observability;

use super::conflict::first_conflict;
use super::{Scheduler, SchedulerError};

impl Scheduler {
    /// Availability is checked after chronology but before the remaining date
    /// rules, so a request that is both taken and invalid reports `RoomUnavailable`.
    pub async fn create_reservation(
        &self,
        name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Reservation, SchedulerError> {
        let started = Instant::now();
        let result = self.create(name, start, end).await;
        observability::record_operation("create_reservation", &result, started);
        result
    }

    async fn create(
        &self,
        name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Reservation, SchedulerError> {
        self.policy.validate_name(name)?;
        let (Some(from), Some(to)) = (start, end) else {
            return Err(SchedulerError::InvalidDate);
        };
        if to < from {
            return Err(SchedulerError::EndBeforeStart);
        }

        let room = self.room().await?;
        let existing = self.store.list_reservations_for_room(room.id).await?;
        if let Some(blocking) = first_conflict(room.id, from, to, &existing, None) {
            debug!("create {from}..{to} rejected: overlaps reservation {}", blocking.number);
            return Err(SchedulerError::RoomUnavailable);
        }

        let stay = self.policy.validate(start, end, self.clock.today())?;
        let reservation = self
            .store
            .insert(NewReservation {
                room_id: room.id,
                name: name.to_string(),
                stay,
            })
            .await?;
        info!(
            "reservation {} created for {}..{}",
            reservation.number, reservation.stay.start, reservation.stay.end
        );
        Ok(reservation)
    }

    /// Full date rules run before the lookup. The conflict check only runs
    /// when the dates actually change, and excludes the reservation itself.
    pub async fn update_reservation(
        &self,
        number: ReservationNumber,
        name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), SchedulerError> {
        let started = Instant::now();
        let result = self.update(number, name, start, end).await;
        observability::record_operation("update_reservation", &result, started);
        result
    }

    async fn update(
        &self,
        number: ReservationNumber,
        name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), SchedulerError> {
        self.policy.validate_name(name)?;
        let stay = self.policy.validate(start, end, self.clock.today())?;

        let mut reservation = self
            .store
            .get_by_number(number)
            .await?
            .ok_or(SchedulerError::NotFound(number))?;

        if reservation.stay != stay {
            let existing = self
                .store
                .list_reservations_for_room(reservation.room_id)
                .await?;
            if let Some(blocking) = first_conflict(
                reservation.room_id,
                stay.start,
                stay.end,
                &existing,
                Some(number),
            ) {
                debug!(
                    "update of {number} to {}..{} rejected: overlaps reservation {}",
                    stay.start, stay.end, blocking.number
                );
                return Err(SchedulerError::RoomUnavailable);
            }
        }

        reservation.name = name.to_string();
        reservation.stay = stay;
        self.store.update(&reservation).await?;
        info!("reservation {number} updated to {}..{}", stay.start, stay.end);
        Ok(())
    }

    pub async fn cancel_reservation(&self, number: ReservationNumber) -> Result<(), SchedulerError> {
        let started = Instant::now();
        let result = self.cancel(number).await;
        observability::record_operation("cancel_reservation", &result, started);
        result
    }

    async fn cancel(&self, number: ReservationNumber) -> Result<(), SchedulerError> {
        let reservation = self
            .store
            .get_by_number(number)
            .await?
            .ok_or(SchedulerError::NotFound(number))?;
        self.store.remove(&reservation).await?;
        info!("reservation {number} cancelled");
        Ok(())
    }
}
