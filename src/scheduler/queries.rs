use std::time::Instant;

use chrono::NaiveDate;

use crate::model::*;
use crate::observability;

use super::conflict::is_available;
use super::{Scheduler, SchedulerError};

impl Scheduler {
    /// Loose calendar probe. Unparsable, past or inverted ranges are simply
    /// unavailable; stay-length and horizon rules are not applied here.
    pub async fn check_availability(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<bool, SchedulerError> {
        let started = Instant::now();
        let result = self.probe(start, end).await;
        observability::record_operation("check_availability", &result, started);
        result
    }

    async fn probe(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<bool, SchedulerError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(false);
        };
        if start < self.clock.today() || end < start {
            return Ok(false);
        }
        let room = self.room().await?;
        let existing = self.store.list_reservations_for_room(room.id).await?;
        Ok(is_available(room.id, start, end, &existing, None))
    }

    pub async fn get_reservation(
        &self,
        number: ReservationNumber,
    ) -> Result<Reservation, SchedulerError> {
        let started = Instant::now();
        let result = self
            .store
            .get_by_number(number)
            .await
            .map_err(SchedulerError::from)
            .and_then(|found| found.ok_or(SchedulerError::NotFound(number)));
        observability::record_operation("get_reservation", &result, started);
        result
    }
}
