//! The JSON availability check used by the room pages' script.
//!
//! Every negative outcome answers `ok: false`. `error` is present only when
//! the question itself could not be answered (bad input, store failure), so
//! a caller can tell "taken" from "broken".

use axum::extract::State;
use axum::{Form, Json};
use domains::{BookingError, DateRange, RoomId};
use serde::{Deserialize, Serialize};

use crate::metrics::{CheckResult, CheckScope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityResponse {
    pub ok: bool,
    pub start: String,
    pub end: String,
    pub room_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn availability_json(
    State(state): State<AppState>,
    Form(form): Form<AvailabilityForm>,
) -> Json<AvailabilityResponse> {
    let room_id = form.room_id.trim().parse::<i32>().ok();
    let mut response = AvailabilityResponse {
        ok: false,
        start: form.start,
        end: form.end,
        room_id,
        error: None,
    };

    let Some(room_id) = room_id else {
        response.error = Some(format!("invalid room_id {:?}", form.room_id));
        return Json(response);
    };
    let stay = match DateRange::parse(&response.start, &response.end) {
        Ok(stay) => stay,
        Err(err) => {
            response.error = Some(err.to_string());
            return Json(response);
        }
    };

    match state
        .flow
        .availability()
        .is_room_available(RoomId(room_id), stay)
        .await
    {
        Ok(available) => {
            let result = if available {
                CheckResult::Available
            } else {
                CheckResult::Unavailable
            };
            state.metrics.record_check(CheckScope::Room, result);
            response.ok = available;
        }
        Err(err) => {
            state.metrics.record_check(CheckScope::Room, CheckResult::Error);
            tracing::error!(%room_id, error = %err, "availability check failed");
            response.error = Some(match err {
                BookingError::StorageUnavailable(_) => "error querying database".to_string(),
                other => other.to_string(),
            });
        }
    }
    Json(response)
}
