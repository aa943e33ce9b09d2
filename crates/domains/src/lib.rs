//! # domains
//!
//! Entities, the date-range model, the error taxonomy and the port traits of
//! the hotel booking service. No I/O happens in this crate.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
