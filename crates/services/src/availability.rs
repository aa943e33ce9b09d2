//! # Availability Engine
//!
//! Answers "is this room free?" and "which rooms are free?" for a date range,
//! computed on demand from the restriction calendar. Results are advisory:
//! the reservation writer repeats the check inside its transaction.

use std::sync::Arc;
use std::time::Duration;

use domains::{BookingError, DateRange, Result, Room, RoomId, RoomRestriction, RoomStore};
use tracing::instrument;

use crate::bounded::bounded;

#[derive(Clone)]
pub struct AvailabilityService {
    rooms: Arc<dyn RoomStore>,
    timeout: Duration,
}

impl AvailabilityService {
    pub fn new(rooms: Arc<dyn RoomStore>, timeout: Duration) -> Self {
        Self { rooms, timeout }
    }

    /// True iff no restriction on `room_id` overlaps `stay`.
    #[instrument(skip_all, fields(%room_id, %stay))]
    pub async fn is_room_available(&self, room_id: RoomId, stay: DateRange) -> Result<bool> {
        let blocking = bounded(
            self.timeout,
            "find_overlapping",
            self.rooms.find_overlapping(room_id, stay),
        )
        .await?;
        tracing::debug!(blocking = blocking.len(), "room availability checked");
        Ok(blocking.is_empty())
    }

    /// Free rooms for `stay`, ascending by name. An empty list is a normal
    /// answer, not an error.
    #[instrument(skip_all, fields(%stay))]
    pub async fn search_all_rooms(&self, stay: DateRange) -> Result<Vec<Room>> {
        let mut rooms = bounded(self.timeout, "find_free_rooms", self.rooms.find_free_rooms(stay)).await?;
        sort_for_display(&mut rooms);
        tracing::debug!(free = rooms.len(), "searched all rooms");
        Ok(rooms)
    }

    pub async fn all_rooms(&self) -> Result<Vec<Room>> {
        let mut rooms = bounded(self.timeout, "all_rooms", self.rooms.all_rooms()).await?;
        sort_for_display(&mut rooms);
        Ok(rooms)
    }

    pub async fn room(&self, id: RoomId) -> Result<Room> {
        bounded(self.timeout, "room_by_id", self.rooms.room_by_id(id))
            .await?
            .ok_or(BookingError::UnknownRoom(id))
    }

    /// The blocks on one room that fall inside `stay`, earliest first.
    #[instrument(skip_all, fields(%room_id, %stay))]
    pub async fn room_calendar(&self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>> {
        self.room(room_id).await?;
        let mut blocks = bounded(
            self.timeout,
            "find_overlapping",
            self.rooms.find_overlapping(room_id, stay),
        )
        .await?;
        blocks.sort_by_key(|b| (b.stay.start(), b.id));
        Ok(blocks)
    }
}

fn sort_for_display(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| a.room_name.cmp(&b.room_name).then(a.id.cmp(&b.id)));
}
