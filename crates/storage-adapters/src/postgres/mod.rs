//! # Postgres Store
//!
//! Implements the room and reservation ports over a `sqlx` pool.
//!
//! Every overlap query uses the half-open predicate
//! `start_date < $end AND $start < end_date`, so a stay ending on day X and
//! one starting on day X never collide.
//!
//! # Developer Note
//! The booking transaction takes `SELECT ... FOR UPDATE` on the room row
//! before re-checking the calendar. Two transactions booking the same room
//! queue on that lock; the second one sees the first one's restriction.

mod rows;

use std::time::Duration;

use async_trait::async_trait;
use domains::{
    BookingError, BookingTransaction, DateRange, GuestDetails, NewReservation, NewRoomRestriction,
    Reservation, ReservationId, ReservationStore, Result, Room, RoomId, RoomRestriction, RoomStore,
};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use rows::{collect, ReservationRow, RoomRestrictionRow, RoomRow};

const ROOM_COLUMNS: &str = "id, room_name, created_at, updated_at";

const ROOM_RESTRICTION_COLUMNS: &str =
    "id, start_date, end_date, room_id, restriction_id, reservation_id, created_at, updated_at";

const RESERVATION_SELECT: &str = "SELECT r.id, r.first_name, r.last_name, r.email, r.phone, \
     r.start_date, r.end_date, r.room_id, rm.room_name, r.processed, r.created_at, r.updated_at \
     FROM reservations r LEFT JOIN rooms rm ON rm.id = r.room_id";

fn storage(err: sqlx::Error) -> BookingError {
    tracing::error!(error = %err, "postgres call failed");
    BookingError::storage(err)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool. `acquire_timeout` bounds the wait for a free connection.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RoomStore for PgStore {
    async fn all_rooms(&self) -> Result<Vec<Room>> {
        let rows: Vec<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY room_name, id"))
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn room_by_id(&self, id: RoomId) -> Result<Option<Room>> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;
        Ok(row.map(Room::from))
    }

    async fn find_overlapping(&self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>> {
        let rows: Vec<RoomRestrictionRow> = sqlx::query_as(&overlapping_sql(false))
            .bind(room_id.0)
            .bind(stay.start())
            .bind(stay.end())
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        collect(rows)
    }

    async fn find_free_rooms(&self, stay: DateRange) -> Result<Vec<Room>> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            "SELECT r.id, r.room_name, r.created_at, r.updated_at FROM rooms r \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM room_restrictions rr \
                 WHERE rr.room_id = r.id AND rr.start_date < $2 AND $1 < rr.end_date \
             ) \
             ORDER BY r.room_name, r.id",
        )
        .bind(stay.start())
        .bind(stay.end())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Room::from).collect())
    }
}

fn overlapping_sql(ordered: bool) -> String {
    format!(
        "SELECT {ROOM_RESTRICTION_COLUMNS} FROM room_restrictions \
         WHERE room_id = $1 AND start_date < $3 AND $2 < end_date{}",
        if ordered { " ORDER BY start_date, id" } else { "" }
    )
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>> {
        let tx = self.pool.begin().await.map_err(storage)?;
        Ok(Box::new(PgBookingTx { tx: Some(tx) }))
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>> {
        let rows: Vec<ReservationRow> =
            sqlx::query_as(&format!("{RESERVATION_SELECT} ORDER BY r.start_date, r.id"))
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        collect(rows)
    }

    async fn new_reservations(&self) -> Result<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "{RESERVATION_SELECT} WHERE r.processed = 0 ORDER BY r.start_date, r.id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        collect(rows)
    }

    async fn reservation_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row: Option<ReservationRow> =
            sqlx::query_as(&format!("{RESERVATION_SELECT} WHERE r.id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;
        row.map(Reservation::try_from).transpose()
    }

    async fn update_guest(&self, id: ReservationId, guest: GuestDetails) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE reservations SET first_name = $1, last_name = $2, email = $3, phone = $4, \
             updated_at = NOW() WHERE id = $5",
        )
        .bind(guest.first_name)
        .bind(guest.last_name)
        .bind(guest.email)
        .bind(guest.phone)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(done.rows_affected() > 0)
    }

    async fn set_processed(&self, id: ReservationId, processed: bool) -> Result<bool> {
        let done = sqlx::query("UPDATE reservations SET processed = $1, updated_at = NOW() WHERE id = $2")
            .bind(i32::from(processed))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_reservation(&self, id: ReservationId) -> Result<bool> {
        // room_restrictions.reservation_id cascades
        let done = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(done.rows_affected() > 0)
    }
}

/// A booking unit of work. Dropping it before `commit` rolls back.
pub struct PgBookingTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgBookingTx {
    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| BookingError::storage("transaction already finished"))
    }
}

#[async_trait]
impl BookingTransaction for PgBookingTx {
    async fn lock_room(&mut self, room_id: RoomId) -> Result<bool> {
        let conn = self.conn()?;
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(room_id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(storage)?;
        Ok(row.is_some())
    }

    async fn find_overlapping(&mut self, room_id: RoomId, stay: DateRange) -> Result<Vec<RoomRestriction>> {
        let conn = self.conn()?;
        let rows: Vec<RoomRestrictionRow> = sqlx::query_as(&overlapping_sql(true))
            .bind(room_id.0)
            .bind(stay.start())
            .bind(stay.end())
            .fetch_all(&mut *conn)
            .await
            .map_err(storage)?;
        collect(rows)
    }

    async fn insert_reservation(&mut self, new: NewReservation) -> Result<Reservation> {
        let conn = self.conn()?;
        let row: ReservationRow = sqlx::query_as(
            "INSERT INTO reservations \
                 (first_name, last_name, email, phone, start_date, end_date, room_id, processed, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, NOW(), NOW()) \
             RETURNING id, first_name, last_name, email, phone, start_date, end_date, room_id, \
                 NULL::varchar AS room_name, processed, created_at, updated_at",
        )
        .bind(new.guest.first_name)
        .bind(new.guest.last_name)
        .bind(new.guest.email)
        .bind(new.guest.phone)
        .bind(new.stay.start())
        .bind(new.stay.end())
        .bind(new.room_id.0)
        .fetch_one(&mut *conn)
        .await
        .map_err(storage)?;
        Reservation::try_from(row)
    }

    async fn insert_room_restriction(&mut self, new: NewRoomRestriction) -> Result<RoomRestriction> {
        let conn = self.conn()?;
        let row: RoomRestrictionRow = sqlx::query_as(&format!(
            "INSERT INTO room_restrictions \
                 (start_date, end_date, room_id, restriction_id, reservation_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             RETURNING {ROOM_RESTRICTION_COLUMNS}"
        ))
        .bind(new.stay.start())
        .bind(new.stay.end())
        .bind(new.room_id.0)
        .bind(new.restriction_id.0)
        .bind(new.reservation_id.map(|id| id.0))
        .fetch_one(&mut *conn)
        .await
        .map_err(storage)?;
        RoomRestriction::try_from(row)
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| BookingError::storage("transaction already finished"))?;
        tx.commit().await.map_err(storage)
    }
}
