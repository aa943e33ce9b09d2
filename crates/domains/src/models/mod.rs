//! # Domain Models
//!
//! These structs represent the core entities of the booking service.
//! Identities are integers assigned by the store.

mod draft;
mod guest;
mod ids;
mod interval;
mod mail;
mod reservation;
mod restriction;
mod room;

pub use draft::{BookingDraft, FlowState};
pub use guest::GuestDetails;
pub use ids::{ReservationId, RestrictionId, RoomId, RoomRestrictionId};
pub use interval::{parse_date, DateRange, DATE_FORMAT};
pub use mail::MailData;
pub use reservation::{NewReservation, Reservation};
pub use restriction::{NewRoomRestriction, Restriction, RoomRestriction};
pub use room::Room;
