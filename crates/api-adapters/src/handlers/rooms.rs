//! Read-only room information.

use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{DateRange, Room, RoomId, RoomRestriction};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<Room>>, ApiError> {
    Ok(Json(state.flow.availability().all_rooms().await?))
}

pub async fn show_room(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.flow.availability().room(RoomId(room_id)).await?))
}

/// Blocks on one room overlapping `[start, end)`.
pub async fn room_restrictions(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<RoomRestriction>>, ApiError> {
    let stay = DateRange::parse(&query.start, &query.end)?;
    let blocks = state
        .flow
        .availability()
        .room_calendar(RoomId(room_id), stay)
        .await?;
    Ok(Json(blocks))
}
