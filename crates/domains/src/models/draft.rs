//! # Booking Draft
//!
//! The session-scoped state machine behind the booking pages:
//!
//! ```text
//! NoDraft -> RangeChosen -> RoomChosen -> DetailsEntered -> Committed
//! ```
//!
//! `NoDraft` is the absence of a draft and `Committed` is represented by the
//! confirmed reservation left for the summary page, so only the three
//! in-progress states are stored.

use serde::{Deserialize, Serialize};

use super::{DateRange, GuestDetails, Room};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookingDraft {
    RangeChosen {
        stay: DateRange,
        /// Candidate rooms shown on the choose-room page.
        rooms: Vec<Room>,
    },
    RoomChosen {
        stay: DateRange,
        room: Room,
        /// Last submitted (invalid) form values, kept for re-display.
        entered: Option<GuestDetails>,
    },
    DetailsEntered {
        stay: DateRange,
        room: Room,
        guest: GuestDetails,
    },
}

/// Flow position, including the two states that are not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    NoDraft,
    RangeChosen,
    RoomChosen,
    DetailsEntered,
    Committed,
}

impl BookingDraft {
    pub fn state(&self) -> FlowState {
        match self {
            BookingDraft::RangeChosen { .. } => FlowState::RangeChosen,
            BookingDraft::RoomChosen { .. } => FlowState::RoomChosen,
            BookingDraft::DetailsEntered { .. } => FlowState::DetailsEntered,
        }
    }

    /// Every stored state carries the requested stay.
    pub fn stay(&self) -> DateRange {
        match self {
            BookingDraft::RangeChosen { stay, .. }
            | BookingDraft::RoomChosen { stay, .. }
            | BookingDraft::DetailsEntered { stay, .. } => *stay,
        }
    }

    pub fn room(&self) -> Option<&Room> {
        match self {
            BookingDraft::RangeChosen { .. } => None,
            BookingDraft::RoomChosen { room, .. } | BookingDraft::DetailsEntered { room, .. } => {
                Some(room)
            }
        }
    }
}
