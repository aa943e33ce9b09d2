//! View documents handed to the rendering layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::{BookingDraft, DateRange, FieldErrors, GuestDetails, Room, DATE_FORMAT};
use serde::Serialize;
use serde_json::{json, Value};
use services::Flashes;

#[derive(Debug, Serialize)]
pub struct View {
    pub view: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_notice: Option<String>,
    pub data: Value,
    #[serde(skip)]
    status: StatusCode,
}

impl View {
    pub fn new(view: &'static str, flashes: Flashes, data: Value) -> Self {
        Self {
            view,
            flash_error: flashes.error,
            flash_notice: flashes.notice,
            data,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub fn stay_data(stay: DateRange) -> Value {
    json!({
        "start": stay.start().format(DATE_FORMAT).to_string(),
        "end": stay.end().format(DATE_FORMAT).to_string(),
        "nights": stay.nights(),
    })
}

/// Data bag of the reservation form: the room, the dates, whatever the
/// guest typed last time and the per-field errors.
pub fn reservation_form(stay: DateRange, room: &Room, guest: &GuestDetails, errors: &FieldErrors) -> Value {
    json!({
        "room": room,
        "stay": stay_data(stay),
        "guest": guest,
        "errors": errors,
    })
}

/// The form for a draft that already has a room, if it has one.
pub fn reservation_form_for(draft: &BookingDraft, errors: &FieldErrors) -> Option<Value> {
    match draft {
        BookingDraft::RangeChosen { .. } => None,
        BookingDraft::RoomChosen {
            stay,
            room,
            entered,
        } => Some(reservation_form(
            *stay,
            room,
            &entered.clone().unwrap_or_default(),
            errors,
        )),
        BookingDraft::DetailsEntered { stay, room, guest } => {
            Some(reservation_form(*stay, room, guest, errors))
        }
    }
}
