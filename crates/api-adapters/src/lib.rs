//! # HTTP Adapters
//!
//! The axum surface of the booking service (feature `web-axum`): the
//! session-backed page flow, the JSON availability endpoint, room
//! information and the operational endpoints.
//!
//! Pages answer with JSON view documents `{view, flash_error, flash_notice, data}`
//! that a template layer can render.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;
#[cfg(feature = "web-axum")]
pub mod views;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use routes::build_router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, CookieSettings};
