use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, ReservationId, RestrictionId, RoomId, RoomRestrictionId};

/// A named reason a room can be blocked ("Reservation", "Owner block").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub id: RestrictionId,
    pub restriction_name: String,
}

/// The calendar-blocking record. Nothing in the schema forbids two of these
/// from overlapping on one room; the reservation writer checks before insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRestriction {
    pub id: RoomRestrictionId,
    pub stay: DateRange,
    pub room_id: RoomId,
    pub restriction_id: RestrictionId,
    /// `None` for blocks that do not come from a reservation.
    pub reservation_id: Option<ReservationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for [`RoomRestriction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoomRestriction {
    pub stay: DateRange,
    pub room_id: RoomId,
    pub restriction_id: RestrictionId,
    pub reservation_id: Option<ReservationId>,
}

impl NewRoomRestriction {
    /// The block that accompanies a freshly inserted reservation.
    pub fn for_reservation(reservation_id: ReservationId, room_id: RoomId, stay: DateRange) -> Self {
        Self {
            stay,
            room_id,
            restriction_id: RestrictionId::RESERVATION,
            reservation_id: Some(reservation_id),
        }
    }
}
