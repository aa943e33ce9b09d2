//! # In-Memory Store
//!
//! A single-process implementation of [`RoomStore`] and [`ReservationStore`].
//!
//! # Developer Note
//! A booking transaction holds the store mutex for its whole lifetime and
//! works on a private copy of the state. `commit` swaps the copy in; dropping
//! the transaction simply discards it. This gives the same all-or-nothing
//! behaviour as the database adapter, with bookings fully serialised.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    BookingError, BookingTransaction, DateRange, GuestDetails, NewReservation, NewRoomRestriction,
    Reservation, ReservationId, ReservationStore, Restriction, RestrictionId, Result, Room, RoomId,
    RoomRestriction, RoomRestrictionId, RoomStore,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct State {
    rooms: BTreeMap<RoomId, Room>,
    restrictions: BTreeMap<RestrictionId, Restriction>,
    reservations: BTreeMap<ReservationId, Reservation>,
    room_restrictions: Vec<RoomRestriction>,
    next_room: i32,
    next_reservation: i32,
    next_room_restriction: i32,
}

impl State {
    fn overlapping(&self, room_id: RoomId, stay: DateRange) -> Vec<RoomRestriction> {
        self.room_restrictions
            .iter()
            .filter(|rr| rr.room_id == room_id && rr.stay.overlaps(&stay))
            .cloned()
            .collect()
    }

    fn with_room_name(&self, mut reservation: Reservation) -> Reservation {
        reservation.room_name = self
            .rooms
            .get(&reservation.room_id)
            .map(|room| room.room_name.clone());
        reservation
    }

    fn sorted_reservations(&self, only_new: bool) -> Vec<Reservation> {
        let mut list: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|r| !only_new || !r.processed)
            .cloned()
            .map(|r| self.with_room_name(r))
            .collect();
        list.sort_by_key(|r| (r.stay.start(), r.id));
        list
    }

    fn insert_reservation(&mut self, new: NewReservation) -> Result<Reservation> {
        if !self.rooms.contains_key(&new.room_id) {
            return Err(BookingError::storage(format!(
                "reservation references missing room {}",
                new.room_id
            )));
        }
        self.next_reservation += 1;
        let now = Utc::now();
        let reservation = Reservation {
            id: ReservationId(self.next_reservation),
            guest: new.guest,
            stay: new.stay,
            room_id: new.room_id,
            room_name: None,
            processed: false,
            created_at: now,
            updated_at: now,
        };
        self.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn insert_room_restriction(&mut self, new: NewRoomRestriction) -> Result<RoomRestriction> {
        if !self.rooms.contains_key(&new.room_id) {
            return Err(BookingError::storage(format!(
                "restriction references missing room {}",
                new.room_id
            )));
        }
        if !self.restrictions.contains_key(&new.restriction_id) {
            return Err(BookingError::storage(format!(
                "unknown restriction kind {}",
                new.restriction_id
            )));
        }
        if let Some(res_id) = new.reservation_id {
            if !self.reservations.contains_key(&res_id) {
                return Err(BookingError::storage(format!(
                    "restriction references missing reservation {res_id}"
                )));
            }
        }
        self.next_room_restriction += 1;
        let now = Utc::now();
        let restriction = RoomRestriction {
            id: RoomRestrictionId(self.next_room_restriction),
            stay: new.stay,
            room_id: new.room_id,
            restriction_id: new.restriction_id,
            reservation_id: new.reservation_id,
            created_at: now,
            updated_at: now,
        };
        self.room_restrictions.push(restriction.clone());
        Ok(restriction)
    }
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    offline: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the two seeded restriction kinds.
    pub fn new() -> Self {
        let mut state = State::default();
        for (id, name) in [
            (RestrictionId::RESERVATION, "Reservation"),
            (RestrictionId::OWNER_BLOCK, "Owner Block"),
        ] {
            state.restrictions.insert(
                id,
                Restriction {
                    id,
                    restriction_name: name.to_string(),
                },
            );
        }
        Self {
            state: Arc::new(Mutex::new(state)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn add_room(&self, room_name: &str) -> Room {
        let mut state = self.state.lock().await;
        state.next_room += 1;
        let id = RoomId(state.next_room);
        put_room(&mut state, id, room_name)
    }

    /// Inserts a room under a fixed id, e.g. to mirror production data.
    pub async fn add_room_with_id(&self, id: RoomId, room_name: &str) -> Room {
        let mut state = self.state.lock().await;
        state.next_room = state.next_room.max(id.0);
        put_room(&mut state, id, room_name)
    }

    /// Places a block that does not come from a reservation (owner block).
    pub async fn block_room(
        &self,
        room_id: RoomId,
        stay: DateRange,
        restriction_id: RestrictionId,
    ) -> Result<RoomRestriction> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        state.insert_room_restriction(NewRoomRestriction {
            stay,
            room_id,
            restriction_id,
            reservation_id: None,
        })
    }

    /// Every stored restriction, in insertion order.
    pub async fn room_restrictions(&self) -> Vec<RoomRestriction> {
        self.state.lock().await.room_restrictions.clone()
    }

    /// Makes every subsequent call fail with `StorageUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        check_online(&self.offline)
    }
}

fn put_room(state: &mut State, id: RoomId, room_name: &str) -> Room {
    let now = Utc::now();
    let room = Room {
        id,
        room_name: room_name.to_string(),
        created_at: now,
        updated_at: now,
    };
    state.rooms.insert(id, room.clone());
    room
}

fn check_online(flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(BookingError::storage("memory store is offline"));
    }
    Ok(())
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn all_rooms(&self) -> Result<Vec<Room>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.room_name.cmp(&b.room_name).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    async fn room_by_id(&self, id: RoomId) -> Result<Option<Room>> {
        self.ensure_online()?;
        Ok(self.state.lock().await.rooms.get(&id).cloned())
    }

    async fn find_overlapping(&self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>> {
        self.ensure_online()?;
        Ok(self.state.lock().await.overlapping(room_id, stay))
    }

    async fn find_free_rooms(&self, stay: DateRange) -> Result<Vec<Room>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|room| state.overlapping(room.id, stay).is_empty())
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_name.cmp(&b.room_name).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>> {
        self.ensure_online()?;
        let live = self.state.clone().lock_owned().await;
        let working = live.clone();
        Ok(Box::new(MemoryTx {
            live,
            working,
            offline: self.offline.clone(),
        }))
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>> {
        self.ensure_online()?;
        Ok(self.state.lock().await.sorted_reservations(false))
    }

    async fn new_reservations(&self) -> Result<Vec<Reservation>> {
        self.ensure_online()?;
        Ok(self.state.lock().await.sorted_reservations(true))
    }

    async fn reservation_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .get(&id)
            .cloned()
            .map(|r| state.with_room_name(r)))
    }

    async fn update_guest(&self, id: ReservationId, guest: GuestDetails) -> Result<bool> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        Ok(match state.reservations.get_mut(&id) {
            Some(reservation) => {
                reservation.guest = guest;
                reservation.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_processed(&self, id: ReservationId, processed: bool) -> Result<bool> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        Ok(match state.reservations.get_mut(&id) {
            Some(reservation) => {
                reservation.processed = processed;
                reservation.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_reservation(&self, id: ReservationId) -> Result<bool> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        if state.reservations.remove(&id).is_none() {
            return Ok(false);
        }
        // cascade
        state
            .room_restrictions
            .retain(|rr| rr.reservation_id != Some(id));
        Ok(true)
    }
}

/// Holds the store lock until dropped.
pub struct MemoryTx {
    live: OwnedMutexGuard<State>,
    working: State,
    offline: Arc<AtomicBool>,
}

#[async_trait]
impl BookingTransaction for MemoryTx {
    async fn lock_room(&mut self, room_id: RoomId) -> Result<bool> {
        check_online(&self.offline)?;
        Ok(self.working.rooms.contains_key(&room_id))
    }

    async fn find_overlapping(&mut self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>> {
        check_online(&self.offline)?;
        Ok(self.working.overlapping(room_id, stay))
    }

    async fn insert_reservation(&mut self, new: NewReservation) -> Result<Reservation> {
        check_online(&self.offline)?;
        self.working.insert_reservation(new)
    }

    async fn insert_room_restriction(&mut self, new: NewRoomRestriction) -> Result<RoomRestriction> {
        check_online(&self.offline)?;
        self.working.insert_room_restriction(new)
    }

    async fn commit(&mut self) -> Result<()> {
        check_online(&self.offline)?;
        *self.live = std::mem::take(&mut self.working);
        Ok(())
    }
}
