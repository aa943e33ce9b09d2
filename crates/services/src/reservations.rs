//! # Reservation Writer
//!
//! Persists a reservation together with the restriction that blocks its room.
//! The availability re-check and both inserts share one transaction, so two
//! sessions racing for the same room cannot both succeed.

use std::sync::Arc;
use std::time::Duration;

use domains::{
    BookingError, GuestDetails, NewReservation, NewRoomRestriction, Reservation, ReservationId,
    ReservationStore, Result,
};
use tracing::instrument;

use crate::bounded::bounded;

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    timeout: Duration,
}

impl ReservationService {
    pub fn new(store: Arc<dyn ReservationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Validates, re-checks availability and writes atomically.
    ///
    /// Fails with `ValidationFailed` before touching the store, with
    /// `RoomNoLongerAvailable` when a block appeared since the advisory
    /// check, and with `StorageUnavailable` on any store failure. In every
    /// failure case nothing is persisted.
    #[instrument(skip_all, fields(room_id = %request.room_id, stay = %request.stay))]
    pub async fn book_reservation(&self, request: NewReservation) -> Result<Reservation> {
        request.guest.check()?;

        let room_id = request.room_id;
        let stay = request.stay;
        let reservation = bounded(self.timeout, "book_reservation", async {
            let mut tx = self.store.begin().await?;

            // 1. Serialise against other bookings of this room
            if !tx.lock_room(room_id).await? {
                return Err(BookingError::UnknownRoom(room_id));
            }

            // 2. Authoritative re-check; the earlier one may be stale
            let clashes = tx.find_overlapping(room_id, stay).await?;
            if !clashes.is_empty() {
                tracing::info!(clashes = clashes.len(), "room taken before commit");
                return Err(BookingError::RoomNoLongerAvailable(room_id));
            }

            // 3. Reservation row, then the block derived from it
            let reservation = tx.insert_reservation(request).await?;
            tx.insert_room_restriction(NewRoomRestriction::for_reservation(
                reservation.id,
                room_id,
                stay,
            ))
            .await?;

            tx.commit().await?;
            Ok(reservation)
        })
        .await?;

        tracing::info!(reservation_id = %reservation.id, "reservation committed");
        Ok(reservation)
    }

    pub async fn all_reservations(&self) -> Result<Vec<Reservation>> {
        bounded(self.timeout, "all_reservations", self.store.all_reservations()).await
    }

    /// Reservations an administrator has not reviewed yet.
    pub async fn new_reservations(&self) -> Result<Vec<Reservation>> {
        bounded(self.timeout, "new_reservations", self.store.new_reservations()).await
    }

    pub async fn reservation(&self, id: ReservationId) -> Result<Reservation> {
        bounded(self.timeout, "reservation_by_id", self.store.reservation_by_id(id))
            .await?
            .ok_or(BookingError::ReservationNotFound(id))
    }

    /// Admin edit of the guest fields; dates and room are not editable here.
    #[instrument(skip(self, guest))]
    pub async fn update_guest(&self, id: ReservationId, guest: GuestDetails) -> Result<()> {
        guest.check()?;
        let found = bounded(self.timeout, "update_guest", self.store.update_guest(id, guest)).await?;
        found.then_some(()).ok_or(BookingError::ReservationNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn mark_processed(&self, id: ReservationId, processed: bool) -> Result<()> {
        let found = bounded(
            self.timeout,
            "set_processed",
            self.store.set_processed(id, processed),
        )
        .await?;
        found.then_some(()).ok_or(BookingError::ReservationNotFound(id))
    }

    /// Removes the reservation and frees its dates.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ReservationId) -> Result<()> {
        let found = bounded(self.timeout, "delete_reservation", self.store.delete_reservation(id)).await?;
        found.then_some(()).ok_or(BookingError::ReservationNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        BookingTransaction, DateRange, MockBookingTransaction, MockReservationStore, RestrictionId,
        RoomId, RoomRestriction, RoomRestrictionId,
    };

    fn request(first_name: &str) -> NewReservation {
        NewReservation {
            guest: GuestDetails::new(first_name, "Sule", "sule@email.com", ""),
            room_id: RoomId(5),
            stay: DateRange::parse("2025-06-01", "2025-06-05").unwrap(),
        }
    }

    fn persisted(new: &NewReservation, id: i32) -> Reservation {
        Reservation {
            id: ReservationId(id),
            guest: new.guest.clone(),
            stay: new.stay,
            room_id: new.room_id,
            room_name: None,
            processed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn blocking(stay: DateRange) -> RoomRestriction {
        RoomRestriction {
            id: RoomRestrictionId(1),
            stay,
            room_id: RoomId(5),
            restriction_id: RestrictionId::RESERVATION,
            reservation_id: Some(ReservationId(7)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(store: MockReservationStore) -> ReservationService {
        ReservationService::new(Arc::new(store), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn books_and_derives_a_reservation_restriction() {
        let mut store = MockReservationStore::new();
        store.expect_begin().times(1).returning(|| {
            let mut tx = MockBookingTransaction::new();
            tx.expect_lock_room().returning(|_| Ok(true));
            tx.expect_find_overlapping().returning(|_, _| Ok(vec![]));
            tx.expect_insert_reservation()
                .times(1)
                .returning(|new| Ok(persisted(&new, 42)));
            tx.expect_insert_room_restriction()
                .withf(|rr| {
                    rr.reservation_id == Some(ReservationId(42))
                        && rr.restriction_id == RestrictionId::RESERVATION
                        && rr.room_id == RoomId(5)
                })
                .times(1)
                .returning(|rr| {
                    Ok(RoomRestriction {
                        id: RoomRestrictionId(1),
                        stay: rr.stay,
                        room_id: rr.room_id,
                        restriction_id: rr.restriction_id,
                        reservation_id: rr.reservation_id,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    })
                });
            tx.expect_commit().times(1).returning(|| Ok(()));
            Ok(Box::new(tx) as Box<dyn BookingTransaction>)
        });

        let reservation = service(store).book_reservation(request("John")).await.unwrap();
        assert_eq!(reservation.id, ReservationId(42));
        assert!(!reservation.processed);
    }

    #[tokio::test]
    async fn validation_failure_never_opens_a_transaction() {
        let mut store = MockReservationStore::new();
        store.expect_begin().never();

        let err = service(store).book_reservation(request("Jo")).await.unwrap_err();
        match err {
            BookingError::ValidationFailed(fields) => assert!(fields.get("first_name").is_some()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlapping_block_aborts_without_inserting() {
        let mut store = MockReservationStore::new();
        store.expect_begin().returning(|| {
            let mut tx = MockBookingTransaction::new();
            tx.expect_lock_room().returning(|_| Ok(true));
            tx.expect_find_overlapping()
                .returning(|_, stay| Ok(vec![blocking(stay)]));
            tx.expect_insert_reservation().never();
            tx.expect_insert_room_restriction().never();
            tx.expect_commit().never();
            Ok(Box::new(tx) as Box<dyn BookingTransaction>)
        });

        let err = service(store).book_reservation(request("John")).await.unwrap_err();
        assert_eq!(err, BookingError::RoomNoLongerAvailable(RoomId(5)));
    }

    #[tokio::test]
    async fn failed_restriction_insert_is_not_committed() {
        let mut store = MockReservationStore::new();
        store.expect_begin().returning(|| {
            let mut tx = MockBookingTransaction::new();
            tx.expect_lock_room().returning(|_| Ok(true));
            tx.expect_find_overlapping().returning(|_, _| Ok(vec![]));
            tx.expect_insert_reservation()
                .returning(|new| Ok(persisted(&new, 1)));
            tx.expect_insert_room_restriction()
                .returning(|_| Err(BookingError::storage("disk full")));
            tx.expect_commit().never();
            Ok(Box::new(tx) as Box<dyn BookingTransaction>)
        });

        let err = service(store).book_reservation(request("John")).await.unwrap_err();
        assert!(matches!(err, BookingError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_room_is_rejected_inside_the_transaction() {
        let mut store = MockReservationStore::new();
        store.expect_begin().returning(|| {
            let mut tx = MockBookingTransaction::new();
            tx.expect_lock_room().returning(|_| Ok(false));
            tx.expect_commit().never();
            Ok(Box::new(tx) as Box<dyn BookingTransaction>)
        });

        let err = service(store).book_reservation(request("John")).await.unwrap_err();
        assert_eq!(err, BookingError::UnknownRoom(RoomId(5)));
    }

    #[tokio::test]
    async fn admin_operations_report_missing_reservations() {
        let mut store = MockReservationStore::new();
        store.expect_set_processed().returning(|_, _| Ok(false));
        store.expect_delete_reservation().returning(|_| Ok(true));
        store.expect_reservation_by_id().returning(|_| Ok(None));

        let svc = service(store);
        assert_eq!(
            svc.mark_processed(ReservationId(3), true).await.unwrap_err(),
            BookingError::ReservationNotFound(ReservationId(3))
        );
        assert!(svc.delete(ReservationId(3)).await.is_ok());
        assert!(svc.reservation(ReservationId(3)).await.is_err());
    }

    #[tokio::test]
    async fn admin_edit_is_validated() {
        let mut store = MockReservationStore::new();
        store.expect_update_guest().never();

        let err = service(store)
            .update_guest(ReservationId(1), GuestDetails::new("Jo", "", "x", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ValidationFailed(_)));
    }
}
