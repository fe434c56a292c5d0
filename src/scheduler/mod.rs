pub mod conflict;
mod error;
mod mutations;
mod queries;
mod store;
mod validate;

pub use conflict::{first_conflict, is_available};
pub use error::SchedulerError;
pub use store::{ReservationStore, StoreError};
pub use validate::BookingPolicy;

use std::sync::Arc;

use crate::clock::Clock;
use crate::model::Room;

/// Reservation scheduling for the singleton room.
///
/// Holds no reservation state of its own: every decision is made against the
/// store, and the store re-checks overlap atomically on every write.
pub struct Scheduler {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            policy: BookingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Resolve the room every operation runs against.
    pub(super) async fn room(&self) -> Result<Room, SchedulerError> {
        self.store
            .singleton_room()
            .await?
            .ok_or(SchedulerError::NoRoom)
    }
}
