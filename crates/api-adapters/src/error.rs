//! # ApiError
//!
//! Maps booking failures to HTTP responses in one place. Page handlers turn
//! recoverable errors into a flash and a redirect themselves; whatever
//! reaches this type is answered directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::BookingError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    /// The session middleware did not run for this route.
    NoSession,
    Internal(String),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(err) => match err {
                BookingError::InvalidRange { .. } | BookingError::InvalidDate { .. } => {
                    StatusCode::BAD_REQUEST
                }
                BookingError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::RoomNoLongerAvailable(_) | BookingError::MissingDraft => {
                    StatusCode::CONFLICT
                }
                BookingError::UnknownRoom(_) | BookingError::ReservationNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                BookingError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NoSession | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Booking(err) => err.to_string(),
            ApiError::NoSession => "session middleware missing".to_string(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Booking(BookingError::ValidationFailed(fields)) => json!({
                "error": self.message(),
                "fields": fields,
            }),
            ApiError::Booking(err) if err.is_recoverable() => json!({ "error": err.to_string() }),
            _ => {
                tracing::error!(error = %self.message(), "request failed");
                json!({ "view": "error", "error": "Something went wrong, please try again." })
            }
        };
        (status, Json(body)).into_response()
    }
}
