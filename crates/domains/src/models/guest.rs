//! # Guest Details
//!
//! Contact fields collected on the reservation form. The rules live on the
//! type so the booking flow and admin edits validate identically.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, FieldError, FieldErrors, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuestDetails {
    #[garde(length(chars, min = 3))]
    pub first_name: String,
    #[garde(length(chars, min = 1))]
    pub last_name: String,
    #[garde(email)]
    pub email: String,
    /// Free-form and optional.
    #[garde(skip)]
    pub phone: String,
}

impl GuestDetails {
    /// Builds the details from raw form input, trimming surrounding
    /// whitespace so a blank-looking field counts as empty.
    pub fn new(
        first_name: impl AsRef<str>,
        last_name: impl AsRef<str>,
        email: impl AsRef<str>,
        phone: impl AsRef<str>,
    ) -> Self {
        Self {
            first_name: first_name.as_ref().trim().to_string(),
            last_name: last_name.as_ref().trim().to_string(),
            email: email.as_ref().trim().to_string(),
            phone: phone.as_ref().trim().to_string(),
        }
    }

    /// Runs the field rules, collecting every failure.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|report| {
            let errors = report
                .iter()
                .map(|(path, error)| FieldError::new(path.to_string(), error.message()))
                .collect();
            BookingError::ValidationFailed(FieldErrors(errors))
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(first: &str) -> GuestDetails {
        GuestDetails::new(first, "Sule", "sule@email.com", "")
    }

    #[test]
    fn first_name_length_boundary() {
        match guest("Jo").check() {
            Err(BookingError::ValidationFailed(errors)) => {
                assert!(errors.get("first_name").is_some());
                assert_eq!(errors.0.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(guest("Joe").check().is_ok());
    }

    #[test]
    fn whitespace_does_not_count_towards_length() {
        assert!(guest("  Jo  ").check().is_err());
    }

    #[test]
    fn reports_every_failing_field() {
        let details = GuestDetails::new("", "", "not-an-email", "555");
        let Err(BookingError::ValidationFailed(errors)) = details.check() else {
            panic!("expected validation failure");
        };
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("last_name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_none());
    }
}
