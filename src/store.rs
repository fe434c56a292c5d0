use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;
use crate::scheduler::conflict::check_no_conflict;
use crate::scheduler::{ReservationStore, StoreError};
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// Reservation store with an in-memory index and an optional write-ahead log.
///
/// Every write takes the room's write lock, re-checks overlap, appends to the
/// log and only then applies to memory, so a failed append changes nothing.
pub struct RoomStore {
    rooms: DashMap<Ulid, SharedRoomState>,
    /// First room ever created; the one the scheduler books.
    primary: OnceLock<Ulid>,
    /// Reverse lookup: reservation number → room id
    number_to_room: DashMap<ReservationNumber, Ulid>,
    next_number: AtomicU32,
    wal: Option<Mutex<Wal>>,
    compact_threshold: u64,
}

/// Apply an event to a room. Caller holds the room's write lock.
fn apply_to_room(rs: &mut RoomState, event: &Event, index: &DashMap<ReservationNumber, Ulid>) {
    match event {
        Event::ReservationCreated { reservation } => {
            rs.insert_reservation(reservation.clone());
            index.insert(reservation.number, reservation.room_id);
        }
        Event::ReservationUpdated { reservation } => {
            rs.remove_reservation(reservation.number);
            rs.insert_reservation(reservation.clone());
        }
        Event::ReservationCancelled { number, .. } => {
            rs.remove_reservation(*number);
            index.remove(number);
        }
        // Room creation and the number watermark are handled at the store level
        Event::RoomCreated { .. } | Event::NumbersReserved { .. } => {}
    }
}

fn event_room_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::ReservationCreated { reservation } | Event::ReservationUpdated { reservation } => {
            Some(reservation.room_id)
        }
        Event::ReservationCancelled { room_id, .. } => Some(*room_id),
        Event::RoomCreated { id, .. } => Some(*id),
        Event::NumbersReserved { .. } => None,
    }
}

impl RoomStore {
    fn build(wal: Option<Wal>, compact_threshold: u64) -> Self {
        Self {
            rooms: DashMap::new(),
            primary: OnceLock::new(),
            number_to_room: DashMap::new(),
            next_number: AtomicU32::new(1),
            wal: wal.map(Mutex::new),
            compact_threshold,
        }
    }

    /// Volatile store; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::build(None, 0)
    }

    /// Durable store backed by the log at `path`, replaying whatever it holds.
    /// A damaged tail is cut off before the log is reopened for appends.
    /// `compact_threshold` appends trigger a compaction; 0 disables it.
    pub fn open(path: &Path, compact_threshold: u64) -> std::io::Result<Self> {
        let events = Wal::recover(path)?;
        let wal = Wal::open(path)?;
        let store = Self::build(Some(wal), compact_threshold);
        store.restore(&events);
        info!(
            "replayed {} events from {}: {} rooms, {} reservations",
            events.len(),
            path.display(),
            store.rooms.len(),
            store.number_to_room.len()
        );
        Ok(store)
    }

    /// Rebuild state from replayed events. Runs before the store is shared,
    /// so rooms are assembled unlocked and wrapped at the end.
    fn restore(&self, events: &[Event]) {
        let mut states: HashMap<Ulid, RoomState> = HashMap::new();
        let mut next: ReservationNumber = 1;

        for event in events {
            match event {
                Event::RoomCreated { id, name, beds } => {
                    let _ = self.primary.set(*id);
                    states.insert(
                        *id,
                        RoomState::new(Room {
                            id: *id,
                            name: name.clone(),
                            beds: *beds,
                        }),
                    );
                }
                Event::NumbersReserved { next: n } => next = next.max(*n),
                other => {
                    if let Event::ReservationCreated { reservation } = other {
                        next = next.max(reservation.number.saturating_add(1));
                    }
                    if let Some(room_id) = event_room_id(other)
                        && let Some(rs) = states.get_mut(&room_id)
                    {
                        apply_to_room(rs, other, &self.number_to_room);
                    }
                }
            }
        }

        self.next_number.store(next, Ordering::SeqCst);
        for (id, rs) in states {
            self.rooms.insert(id, Arc::new(RwLock::new(rs)));
        }
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(self.number_to_room.len() as f64);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.number_to_room.len()
    }

    fn get_room(&self, id: &Ulid) -> Result<SharedRoomState, StoreError> {
        self.rooms
            .get(id)
            .map(|e| e.value().clone())
            .ok_or(StoreError::RoomNotFound(*id))
    }

    fn room_for_number(&self, number: ReservationNumber) -> Result<Ulid, StoreError> {
        self.number_to_room
            .get(&number)
            .map(|e| *e.value())
            .ok_or(StoreError::NotFound(number))
    }

    pub async fn create_room(&self, name: &str, beds: u32) -> Result<Room, StoreError> {
        if name.chars().count() > MAX_ROOM_NAME_LEN {
            return Err(StoreError::LimitExceeded("room name too long"));
        }
        let room = Room {
            id: Ulid::new(),
            name: name.to_string(),
            beds,
        };
        let event = Event::RoomCreated {
            id: room.id,
            name: room.name.clone(),
            beds,
        };
        // Hold the log across the map insert so compaction sees every room it logged.
        let _wal = match &self.wal {
            Some(wal) => {
                let mut guard = wal.lock().await;
                guard
                    .append(&event)
                    .map_err(|e| StoreError::WalError(e.to_string()))?;
                Some(guard)
            }
            None => None,
        };
        self.rooms
            .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
        let _ = self.primary.set(room.id);
        info!("room {} ({}) created with {beds} beds", room.id, room.name);
        Ok(room)
    }

    /// Return the singleton room, creating it if the store has none.
    pub async fn ensure_room(&self, name: &str, beds: u32) -> Result<Room, StoreError> {
        match self.singleton_room().await? {
            Some(room) => Ok(room),
            None => self.create_room(name, beds).await,
        }
    }

    async fn wal_append(&self, event: &Event) -> Result<(), StoreError> {
        let Some(wal) = &self.wal else {
            return Ok(());
        };
        let mut wal = wal.lock().await;
        let flush_start = Instant::now();
        wal.append(event)
            .map_err(|e| StoreError::WalError(e.to_string()))?;
        metrics::histogram!(observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        Ok(())
    }

    /// WAL-append + apply in one call.
    async fn persist_and_apply(&self, rs: &mut RoomState, event: &Event) -> Result<(), StoreError> {
        self.wal_append(event).await?;
        apply_to_room(rs, event, &self.number_to_room);
        Ok(())
    }

    /// Bookkeeping after a successful write. Caller must not hold a room lock.
    async fn after_write(&self) {
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(self.number_to_room.len() as f64);
        self.maybe_compact().await;
    }

    /// Rewrite the log as the minimal event set for the current state once
    /// enough appends have accumulated. Deferred if any room is being written.
    async fn maybe_compact(&self) {
        let Some(wal) = &self.wal else {
            return;
        };
        if self.compact_threshold == 0 {
            return;
        }
        let mut wal = wal.lock().await;
        if wal.appends_since_compact() < self.compact_threshold {
            return;
        }

        let primary = self.primary.get().copied();
        let mut rooms: Vec<(Ulid, SharedRoomState)> = self
            .rooms
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        rooms.sort_by_key(|(id, _)| (Some(*id) != primary, *id));

        let mut guards = Vec::with_capacity(rooms.len());
        for (id, rs) in &rooms {
            match rs.try_read() {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    debug!("compaction deferred: room {id} busy");
                    return;
                }
            }
        }

        let mut events = Vec::new();
        for guard in &guards {
            events.push(Event::RoomCreated {
                id: guard.room.id,
                name: guard.room.name.clone(),
                beds: guard.room.beds,
            });
            for reservation in &guard.reservations {
                events.push(Event::ReservationCreated {
                    reservation: reservation.clone(),
                });
            }
        }
        events.push(Event::NumbersReserved {
            next: self.next_number.load(Ordering::SeqCst),
        });

        match wal.compact(&events) {
            Ok(()) => {
                metrics::counter!(observability::WAL_COMPACTIONS_TOTAL).increment(1);
                info!("compacted {} to {} events", wal.path().display(), events.len());
            }
            Err(e) => warn!("WAL compaction failed: {e}"),
        }
    }
}

#[async_trait]
impl ReservationStore for RoomStore {
    async fn list_reservations_for_room(&self, room_id: Ulid) -> Result<Vec<Reservation>, StoreError> {
        let rs = self.get_room(&room_id)?;
        let guard = rs.read().await;
        Ok(guard.reservations.clone())
    }

    async fn get_by_number(&self, number: ReservationNumber) -> Result<Option<Reservation>, StoreError> {
        let Ok(room_id) = self.room_for_number(number) else {
            return Ok(None);
        };
        let rs = self.get_room(&room_id)?;
        let guard = rs.read().await;
        Ok(guard.get(number).cloned())
    }

    async fn singleton_room(&self) -> Result<Option<Room>, StoreError> {
        let Some(id) = self.primary.get() else {
            return Ok(None);
        };
        let rs = self.get_room(id)?;
        let guard = rs.read().await;
        Ok(Some(guard.room.clone()))
    }

    async fn insert(&self, new: NewReservation) -> Result<Reservation, StoreError> {
        let rs = self.get_room(&new.room_id)?;
        let mut guard = rs.write().await;
        if guard.reservations.len() >= MAX_RESERVATIONS_PER_ROOM {
            return Err(StoreError::LimitExceeded("too many reservations on room"));
        }
        check_no_conflict(&guard, &new.stay, None)?;

        let reservation = Reservation {
            id: Ulid::new(),
            number: self.next_number.fetch_add(1, Ordering::SeqCst),
            room_id: new.room_id,
            name: new.name,
            stay: new.stay,
        };
        let event = Event::ReservationCreated {
            reservation: reservation.clone(),
        };
        self.persist_and_apply(&mut guard, &event).await?;
        drop(guard);

        self.after_write().await;
        Ok(reservation)
    }

    async fn update(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let room_id = self.room_for_number(reservation.number)?;
        let rs = self.get_room(&room_id)?;
        let mut guard = rs.write().await;
        let Some(stored) = guard.get(reservation.number) else {
            return Err(StoreError::NotFound(reservation.number));
        };
        check_no_conflict(&guard, &reservation.stay, Some(reservation.number))?;

        // Identity and room never change on update.
        let updated = Reservation {
            id: stored.id,
            room_id,
            ..reservation.clone()
        };
        let event = Event::ReservationUpdated { reservation: updated };
        self.persist_and_apply(&mut guard, &event).await?;
        drop(guard);

        self.after_write().await;
        Ok(())
    }

    async fn remove(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let room_id = self.room_for_number(reservation.number)?;
        let rs = self.get_room(&room_id)?;
        let mut guard = rs.write().await;
        if guard.get(reservation.number).is_none() {
            return Err(StoreError::NotFound(reservation.number));
        }
        let event = Event::ReservationCancelled {
            room_id,
            number: reservation.number,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        drop(guard);

        self.after_write().await;
        Ok(())
    }
}
