//! The session-scoped booking flow end to end over real adapters.

use std::sync::Arc;

use domains::{
    BookingDraft, BookingError, DateRange, FlowState, GuestDetails, NewReservation, ReservationStore,
    RestrictionId,
};
use integration_tests::{
    booking_flow, reservations, session, session_store, single_room_store, two_room_store,
    RecordingNotifier, OWNER_EMAIL,
};
use services::SearchOutcome;

fn john() -> GuestDetails {
    GuestDetails::new("John", "Sule", "sule@email.com", "")
}

#[tokio::test]
async fn search_choose_enter_confirm() {
    let (store, room) = single_room_store().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let flow = booking_flow(&store, notifier.clone());
    let sessions = session_store();
    let guest_session = session(&sessions, "guest-1");

    let outcome = flow
        .submit_date_range(&guest_session, "2025-01-01", "2025-12-12")
        .await
        .unwrap();
    let SearchOutcome::RoomsAvailable { rooms, .. } = outcome else {
        panic!("expected rooms, got {outcome:?}");
    };
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_name, "General's quarters");
    assert_eq!(flow.current(&guest_session).await.unwrap().state(), FlowState::RangeChosen);

    let draft = flow.choose_room(&guest_session, room.id).await.unwrap();
    assert_eq!(draft.state(), FlowState::RoomChosen);

    let draft = flow.enter_details(&guest_session, john()).await.unwrap();
    assert_eq!(draft.state(), FlowState::DetailsEntered);

    let reservation = flow.confirm(&guest_session).await.unwrap();
    assert_eq!(reservation.room_id, room.id);
    assert!(!reservation.processed);

    // Persisted, and the draft is gone.
    let stored = store.reservation_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.guest.first_name, "John");
    assert!(!stored.processed);
    assert_eq!(flow.current(&guest_session).await.unwrap_err(), BookingError::MissingDraft);

    // Summary is readable exactly once.
    assert_eq!(flow.summary(&guest_session).await.unwrap().id, reservation.id);
    assert_eq!(flow.summary(&guest_session).await.unwrap_err(), BookingError::MissingDraft);

    let mails = notifier.sent();
    assert_eq!(mails.len(), 2);
    assert_eq!(mails[0].to, "sule@email.com");
    assert_eq!(mails[1].to, OWNER_EMAIL);
}

#[tokio::test]
async fn short_first_name_keeps_the_draft_and_the_input() {
    let (store, room) = single_room_store().await;
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let s = session(&sessions, "guest-2");

    flow.submit_date_range(&s, "2025-01-01", "2025-01-05").await.unwrap();
    flow.choose_room(&s, room.id).await.unwrap();

    let err = flow
        .enter_details(&s, GuestDetails::new("Jo", "Sule", "sule@email.com", ""))
        .await
        .unwrap_err();
    let BookingError::ValidationFailed(fields) = err else {
        panic!("expected validation failure");
    };
    assert!(fields.get("first_name").is_some());

    match flow.current(&s).await.unwrap() {
        BookingDraft::RoomChosen { entered: Some(entered), .. } => {
            assert_eq!(entered.first_name, "Jo");
        }
        other => panic!("unexpected draft {other:?}"),
    }
    assert_eq!(flow.confirm(&s).await.unwrap_err(), BookingError::MissingDraft);
    assert!(store.all_reservations().await.unwrap().is_empty());
}

#[tokio::test]
async fn losing_the_race_returns_to_room_choice() {
    let (store, quarters, suite) = two_room_store().await;
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let s = session(&sessions, "guest-3");

    flow.submit_date_range(&s, "2025-03-01", "2025-03-04").await.unwrap();
    flow.choose_room(&s, quarters.id).await.unwrap();
    flow.enter_details(&s, john()).await.unwrap();

    // Another guest books the same room directly in between.
    reservations(&store)
        .book_reservation(NewReservation {
            guest: GuestDetails::new("Mary", "Major", "mary@email.com", ""),
            room_id: quarters.id,
            stay: flow.current(&s).await.unwrap().stay(),
        })
        .await
        .unwrap();

    let err = flow.confirm(&s).await.unwrap_err();
    assert_eq!(err, BookingError::RoomNoLongerAvailable(quarters.id));

    match flow.current(&s).await.unwrap() {
        BookingDraft::RangeChosen { rooms, .. } => assert_eq!(rooms, vec![suite]),
        other => panic!("unexpected draft {other:?}"),
    }
    assert_eq!(store.all_reservations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sessions_do_not_share_drafts() {
    let (store, _) = single_room_store().await;
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let a = session(&sessions, "a");
    let b = session(&sessions, "b");

    flow.submit_date_range(&a, "2025-01-01", "2025-01-05").await.unwrap();
    assert_eq!(flow.current(&b).await.unwrap_err(), BookingError::MissingDraft);
}

#[tokio::test]
async fn bad_dates_never_create_a_draft() {
    let (store, _) = single_room_store().await;
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let s = session(&sessions, "guest-4");

    assert!(matches!(
        flow.submit_date_range(&s, "2025-01-05", "2025-01-01").await,
        Err(BookingError::InvalidRange { .. })
    ));
    assert!(matches!(
        flow.submit_date_range(&s, "yesterday", "2025-01-01").await,
        Err(BookingError::InvalidDate { field: "start", .. })
    ));
    assert_eq!(flow.current(&s).await.unwrap_err(), BookingError::MissingDraft);
}

#[tokio::test]
async fn a_blocked_room_cannot_be_chosen() {
    let (store, quarters, suite) = two_room_store().await;
    store
        .block_room(
            quarters.id,
            DateRange::parse("2025-03-01", "2025-03-10").unwrap(),
            RestrictionId::OWNER_BLOCK,
        )
        .await
        .unwrap();
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let s = session(&sessions, "guest-5");

    let SearchOutcome::RoomsAvailable { rooms, .. } =
        flow.submit_date_range(&s, "2025-03-02", "2025-03-04").await.unwrap()
    else {
        panic!("expected rooms");
    };
    assert_eq!(rooms, vec![suite.clone()]);

    assert_eq!(
        flow.choose_room(&s, quarters.id).await.unwrap_err(),
        BookingError::RoomNoLongerAvailable(quarters.id)
    );
    assert_eq!(flow.current(&s).await.unwrap().state(), FlowState::RangeChosen);
    assert_eq!(flow.choose_room(&s, suite.id).await.unwrap().state(), FlowState::RoomChosen);
}

#[tokio::test]
async fn a_failed_search_drops_the_earlier_draft() {
    let (store, quarters, _) = two_room_store().await;
    let flow = booking_flow(&store, Arc::new(RecordingNotifier::default()));
    let sessions = session_store();
    let s = session(&sessions, "guest-6");

    flow.book_room(&s, quarters.id, "2025-03-02", "2025-03-04").await.unwrap();
    assert!(matches!(
        flow.submit_date_range(&s, "2025-03-09", "2025-03-01").await,
        Err(BookingError::InvalidRange { .. })
    ));
    assert_eq!(flow.current(&s).await.unwrap_err(), BookingError::MissingDraft);
}
