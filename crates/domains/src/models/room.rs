use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RoomId;

/// Reference data: a bookable room. Read-only to the booking core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
