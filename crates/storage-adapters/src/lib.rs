//! # Storage Adapters
//!
//! Concrete implementations of the `domains` ports.
//!
//! - [`memory`]: in-process store used by tests and local demos
//! - [`postgres`]: the production store (feature `db-postgres`)
//! - [`session`]: idle-expiring session scratch space
//! - [`mailer`]: background mail dispatch

pub mod mailer;
pub mod memory;
pub mod session;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use mailer::{LogTransport, MailDispatcher, MailTransport};
pub use memory::MemoryStore;
pub use session::MemorySessionStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
