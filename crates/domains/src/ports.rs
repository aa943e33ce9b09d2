//! # Ports
//!
//! The capabilities the booking core needs from the outside world. Every
//! adapter (Postgres, in-memory fixture, session backend, mailer) implements
//! these and is chosen once, at construction.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    DateRange, GuestDetails, MailData, NewReservation, NewRoomRestriction, Reservation,
    ReservationId, Room, RoomId, RoomRestriction,
};

/// Read side of the restriction calendar plus room reference data.
///
/// All methods are pure reads; they are advisory and run at the store's
/// default isolation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Every room, ordered by name.
    async fn all_rooms(&self) -> Result<Vec<Room>>;

    async fn room_by_id(&self, id: RoomId) -> Result<Option<Room>>;

    /// Restrictions on `room_id` whose interval overlaps `stay`.
    async fn find_overlapping(&self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>>;

    /// Rooms with no restriction overlapping `stay`, ordered by name.
    async fn find_free_rooms(&self, stay: DateRange) -> Result<Vec<Room>>;
}

/// Write side: transactional booking plus the admin review operations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Opens a unit of work. Dropping it without `commit` discards every write.
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>>;

    /// All reservations ordered by start date, with room names.
    async fn all_reservations(&self) -> Result<Vec<Reservation>>;

    /// Reservations not yet marked processed, ordered by start date.
    async fn new_reservations(&self) -> Result<Vec<Reservation>>;

    async fn reservation_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Returns `false` when no such reservation exists.
    async fn update_guest(&self, id: ReservationId, guest: GuestDetails) -> Result<bool>;

    async fn set_processed(&self, id: ReservationId, processed: bool) -> Result<bool>;

    /// Deletes the reservation and the restriction derived from it.
    async fn delete_reservation(&self, id: ReservationId) -> Result<bool>;
}

/// One atomic booking: check, then two inserts, then commit.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BookingTransaction: Send {
    /// Serialises concurrent bookings of the same room until commit or drop.
    /// Returns `false` if the room does not exist.
    async fn lock_room(&mut self, room_id: RoomId) -> Result<bool>;

    async fn find_overlapping(&mut self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>>;

    async fn insert_reservation(&mut self, new: NewReservation) -> Result<Reservation>;

    async fn insert_room_restriction(&mut self, new: NewRoomRestriction) -> Result<RoomRestriction>;

    async fn commit(&mut self) -> Result<()>;
}

/// Opaque browser-session identifier carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session key/value scratch area with put-and-pop semantics.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: &SessionId, key: &str, value: Value) -> Result<()>;

    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<Value>>;

    /// Reads and removes in one step (flash messages, confirmations).
    async fn pop(&self, session: &SessionId, key: &str) -> Result<Option<Value>>;
}

/// Fire-and-forget mail hand-off. Delivery failures are the adapter's to log.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, mail: MailData);
}
