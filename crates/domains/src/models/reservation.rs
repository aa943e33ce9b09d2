use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, GuestDetails, ReservationId, RoomId};

/// A guest's stay as persisted in `reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    #[serde(flatten)]
    pub guest: GuestDetails,
    pub stay: DateRange,
    pub room_id: RoomId,
    /// Display name of the room, when the query joined `rooms`.
    pub room_name: Option<String>,
    /// `false` until an administrator has reviewed it.
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated booking request, ready for the reservation writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub guest: GuestDetails,
    pub room_id: RoomId,
    pub stay: DateRange,
}
