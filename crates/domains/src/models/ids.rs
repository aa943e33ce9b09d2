//! Integer identities assigned by the backing store.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Primary key of `rooms`.
    RoomId
);
define_id!(
    /// Primary key of `reservations`.
    ReservationId
);
define_id!(
    /// Primary key of `restrictions` (the kind of block).
    RestrictionId
);
define_id!(RoomRestrictionId);

impl RestrictionId {
    /// Seeded kind for blocks derived from a guest reservation.
    pub const RESERVATION: RestrictionId = RestrictionId(1);
    /// Seeded kind for blocks placed by the owner.
    pub const OWNER_BLOCK: RestrictionId = RestrictionId(2);
}
