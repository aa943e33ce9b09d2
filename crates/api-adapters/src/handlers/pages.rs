//! # Page Flow Handlers
//!
//! One handler per step of the booking flow. Each runs the matching
//! `BookingFlow` operation and then either renders a view or redirects.
//!
//! # Developer Note
//! Recoverable failures are reported through a flash message and a
//! `303 See Other` to the step the guest has to redo. Only storage failures
//! propagate as [`ApiError`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use domains::{BookingDraft, BookingError, FieldErrors, GuestDetails, RoomId};
use serde::Deserialize;
use serde_json::json;
use services::{Flash, SearchOutcome, Session};

use crate::error::ApiError;
use crate::metrics::{BookingOutcome, CheckResult, CheckScope};
use crate::middleware::BrowserSession;
use crate::state::AppState;
use crate::views::{reservation_form_for, stay_data, View};

const SEARCH: &str = "/search-availability";
const CHOOSE_ROOM: &str = "/choose-room";
const MAKE_RESERVATION: &str = "/make-reservation";
const SUMMARY: &str = "/reservation-summary";

const NO_AVAILABILITY: &str = "No availability";
const NO_DRAFT: &str = "Can't get reservation from session";
const NO_SUMMARY: &str = "No reservation found";
const ROOM_TAKEN: &str = "Sorry, that room was just booked for your dates. Please choose another.";

type PageResult = Result<Response, ApiError>;

#[derive(Debug, Deserialize)]
pub struct DateRangeForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct BookRoomQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub s: String,
    #[serde(default)]
    pub e: String,
}

#[derive(Debug, Deserialize)]
pub struct GuestForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Flashes `err` and redirects to `to`; storage failures pass through.
async fn bounce(session: &Session, err: BookingError, to: &str) -> PageResult {
    if !err.is_recoverable() {
        return Err(err.into());
    }
    let message = match err {
        BookingError::MissingDraft => NO_DRAFT.to_string(),
        other => other.to_string(),
    };
    session.flash(Flash::Error(message)).await?;
    Ok(Redirect::to(to).into_response())
}

pub async fn home(session: BrowserSession) -> PageResult {
    let flashes = session.take_flashes().await?;
    Ok(View::new("home", flashes, json!({})).into_response())
}

pub async fn search_page(session: BrowserSession) -> PageResult {
    let flashes = session.take_flashes().await?;
    Ok(View::new("search-availability", flashes, json!({})).into_response())
}

pub async fn search_submit(
    State(state): State<AppState>,
    session: BrowserSession,
    Form(form): Form<DateRangeForm>,
) -> PageResult {
    let outcome = state
        .flow
        .submit_date_range(&session, &form.start, &form.end)
        .await;

    match outcome {
        Ok(SearchOutcome::RoomsAvailable { .. }) => {
            state.metrics.record_check(CheckScope::AllRooms, CheckResult::Available);
            Ok(Redirect::to(CHOOSE_ROOM).into_response())
        }
        Ok(SearchOutcome::NoAvailability { .. }) => {
            state.metrics.record_check(CheckScope::AllRooms, CheckResult::Unavailable);
            session.flash(Flash::Error(NO_AVAILABILITY.to_string())).await?;
            Ok(Redirect::to(SEARCH).into_response())
        }
        Err(err) => {
            if !err.is_recoverable() {
                state.metrics.record_check(CheckScope::AllRooms, CheckResult::Error);
            }
            bounce(&session, err, SEARCH).await
        }
    }
}

pub async fn choose_room_page(State(state): State<AppState>, session: BrowserSession) -> PageResult {
    let draft = match state.flow.current(&session).await {
        Ok(draft) => draft,
        Err(err) => return bounce(&session, err, SEARCH).await,
    };

    let stay = draft.stay();
    let rooms = match draft {
        BookingDraft::RangeChosen { rooms, .. } => rooms,
        // Came back from a later step: list what is free now.
        _ => state.flow.availability().search_all_rooms(stay).await?,
    };

    let flashes = session.take_flashes().await?;
    Ok(View::new(
        "choose-room",
        flashes,
        json!({ "stay": stay_data(stay), "rooms": rooms }),
    )
    .into_response())
}

pub async fn choose_room(
    State(state): State<AppState>,
    session: BrowserSession,
    Path(room_id): Path<i32>,
) -> PageResult {
    match state.flow.choose_room(&session, RoomId(room_id)).await {
        Ok(_) => Ok(Redirect::to(MAKE_RESERVATION).into_response()),
        Err(err @ (BookingError::UnknownRoom(_) | BookingError::RoomNoLongerAvailable(_))) => {
            bounce(&session, err, CHOOSE_ROOM).await
        }
        Err(err) => bounce(&session, err, SEARCH).await,
    }
}

pub async fn book_room(
    State(state): State<AppState>,
    session: BrowserSession,
    Query(query): Query<BookRoomQuery>,
) -> PageResult {
    let Ok(room_id) = query.id.trim().parse::<i32>() else {
        session
            .flash(Flash::Error(format!("invalid room id {:?}", query.id)))
            .await?;
        return Ok(Redirect::to(SEARCH).into_response());
    };

    match state
        .flow
        .book_room(&session, RoomId(room_id), &query.s, &query.e)
        .await
    {
        Ok(_) => Ok(Redirect::to(MAKE_RESERVATION).into_response()),
        Err(err) => bounce(&session, err, SEARCH).await,
    }
}

pub async fn reservation_page(State(state): State<AppState>, session: BrowserSession) -> PageResult {
    let draft = match state.flow.current(&session).await {
        Ok(draft) => draft,
        Err(err) => return bounce(&session, err, SEARCH).await,
    };
    let Some(data) = reservation_form_for(&draft, &FieldErrors::default()) else {
        return Ok(Redirect::to(CHOOSE_ROOM).into_response());
    };

    let flashes = session.take_flashes().await?;
    Ok(View::new("make-reservation", flashes, data).into_response())
}

/// Records the guest details and books the room in one submission.
pub async fn reservation_submit(
    State(state): State<AppState>,
    session: BrowserSession,
    Form(form): Form<GuestForm>,
) -> PageResult {
    let guest = GuestDetails::new(&form.first_name, &form.last_name, &form.email, &form.phone);

    match state.flow.enter_details(&session, guest).await {
        Ok(_) => {}
        Err(BookingError::ValidationFailed(errors)) => {
            state.metrics.record_booking(BookingOutcome::Invalid);
            let draft = state.flow.current(&session).await?;
            let data = reservation_form_for(&draft, &errors).unwrap_or_else(|| json!({}));
            let flashes = session.take_flashes().await?;
            return Ok(View::new("make-reservation", flashes, data)
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response());
        }
        Err(err) => return bounce(&session, err, SEARCH).await,
    }

    match state.flow.confirm(&session).await {
        Ok(reservation) => {
            state.metrics.record_booking(BookingOutcome::Committed);
            tracing::info!(reservation_id = %reservation.id, "booking confirmed");
            Ok(Redirect::to(SUMMARY).into_response())
        }
        Err(BookingError::RoomNoLongerAvailable(_)) => {
            state.metrics.record_booking(BookingOutcome::Conflict);
            session.flash(Flash::Error(ROOM_TAKEN.to_string())).await?;
            Ok(Redirect::to(CHOOSE_ROOM).into_response())
        }
        Err(err) => {
            if !err.is_recoverable() {
                state.metrics.record_booking(BookingOutcome::Error);
            }
            bounce(&session, err, SEARCH).await
        }
    }
}

pub async fn summary_page(State(state): State<AppState>, session: BrowserSession) -> PageResult {
    match state.flow.summary(&session).await {
        Ok(reservation) => {
            let flashes = session.take_flashes().await?;
            Ok(View::new(
                "reservation-summary",
                flashes,
                json!({ "reservation": reservation, "stay": stay_data(reservation.stay) }),
            )
            .into_response())
        }
        Err(BookingError::MissingDraft) => {
            session.flash(Flash::Error(NO_SUMMARY.to_string())).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(err) => Err(err.into()),
    }
}
