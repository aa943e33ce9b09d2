//! Row shapes as returned by Postgres, converted into domain models.

use chrono::{DateTime, NaiveDate, Utc};
use domains::{
    BookingError, DateRange, GuestDetails, Reservation, ReservationId, RestrictionId, Result, Room,
    RoomId, RoomRestriction, RoomRestrictionId,
};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RoomRow {
    pub id: i32,
    pub room_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: RoomId(row.id),
            room_name: row.room_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct RoomRestrictionRow {
    pub id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: i32,
    pub restriction_id: i32,
    pub reservation_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRestrictionRow> for RoomRestriction {
    type Error = BookingError;

    fn try_from(row: RoomRestrictionRow) -> Result<Self> {
        Ok(RoomRestriction {
            id: RoomRestrictionId(row.id),
            stay: stored_range(row.start_date, row.end_date)?,
            room_id: RoomId(row.room_id),
            restriction_id: RestrictionId(row.restriction_id),
            reservation_id: row.reservation_id.map(ReservationId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ReservationRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_id: i32,
    pub room_name: Option<String>,
    pub processed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = BookingError;

    fn try_from(row: ReservationRow) -> Result<Self> {
        Ok(Reservation {
            id: ReservationId(row.id),
            guest: GuestDetails {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
            },
            stay: stored_range(row.start_date, row.end_date)?,
            room_id: RoomId(row.room_id),
            room_name: row.room_name,
            processed: row.processed != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// The schema CHECK makes this unreachable unless the table was edited by hand.
fn stored_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    DateRange::new(start, end)
        .map_err(|err| BookingError::storage(format!("corrupt stored range: {err}")))
}

pub(super) fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = BookingError>,
{
    rows.into_iter().map(T::try_from).collect()
}
