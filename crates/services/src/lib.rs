//! # services
//!
//! The booking core: the availability engine, the transactional reservation
//! writer and the session-scoped booking flow. Everything here talks to the
//! outside world only through the ports defined in `domains`.

pub mod availability;
pub mod booking_flow;
pub mod mail;
pub mod reservations;
pub mod session;

mod bounded;

pub use availability::AvailabilityService;
pub use booking_flow::{BookingFlow, FlowSettings, SearchOutcome};
pub use reservations::ReservationService;
pub use session::{Flash, Flashes, Session};
