use chrono::NaiveDate;

use crate::limits::*;
use crate::model::Stay;

use super::SchedulerError;

/// Business rules a stay must satisfy before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Maximum `end - start`, in days.
    pub max_stay_nights: i64,
    /// How far ahead of today a stay may start or end, in days.
    pub horizon_days: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_stay_nights: DEFAULT_MAX_STAY_NIGHTS,
            horizon_days: DEFAULT_BOOKING_HORIZON_DAYS,
        }
    }
}

impl BookingPolicy {
    /// Checks in order, first failure wins: parsable dates, chronology,
    /// not in the past, stay length, booking horizon.
    pub fn validate(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Stay, SchedulerError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(SchedulerError::InvalidDate);
        };
        if end < start {
            return Err(SchedulerError::EndBeforeStart);
        }
        if start < today {
            return Err(SchedulerError::PastDate);
        }
        let stay = Stay::new(start, end);
        let nights = stay.nights();
        if nights > self.max_stay_nights {
            return Err(SchedulerError::TooLong {
                nights,
                max: self.max_stay_nights,
            });
        }
        if (start - today).num_days() > self.horizon_days
            || (end - today).num_days() > self.horizon_days
        {
            return Err(SchedulerError::TooFarInAdvance {
                horizon_days: self.horizon_days,
            });
        }
        Ok(stay)
    }

    pub fn validate_name(&self, name: &str) -> Result<(), SchedulerError> {
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidName("name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(SchedulerError::InvalidName("name too long"));
        }
        Ok(())
    }
}
