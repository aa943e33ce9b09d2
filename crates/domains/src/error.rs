//! # BookingError
//!
//! Centralized error handling for the booking core.
//! Every variant is scoped to a single request; none is fatal to the process.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ReservationId, RoomId};

/// The primary error type for all booking operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// `start` is not strictly before `end`.
    #[error("invalid date range: {start} is not before {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A date field could not be parsed as `YYYY-MM-DD`.
    #[error("invalid {field} date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    /// Guest fields failed validation; nothing was written.
    #[error("validation failed: {0}")]
    ValidationFailed(FieldErrors),

    /// The room was taken between the advisory check and the commit.
    #[error("room {0} is no longer available for the requested dates")]
    RoomNoLongerAvailable(RoomId),

    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),

    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// A flow step was reached without the state it depends on.
    #[error("no booking in progress for this session")]
    MissingDraft,

    /// Infrastructure failure (DB down, timeout, session backend)
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl BookingError {
    pub fn storage(reason: impl fmt::Display) -> Self {
        BookingError::StorageUnavailable(reason.to_string())
    }

    /// Errors the user can fix by resubmitting.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookingError::StorageUnavailable(_))
    }
}

/// A single field-level complaint, e.g. `first_name: length is lower than 3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Ordered list of field errors, rendered next to the offending inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    /// First reason recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.reason.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.reason)?;
            first = false;
        }
        Ok(())
    }
}

/// A specialized Result type for booking logic.
pub type Result<T> = std::result::Result<T, BookingError>;
