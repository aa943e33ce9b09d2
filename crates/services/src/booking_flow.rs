//! # Booking Flow
//!
//! Drives one session's [`BookingDraft`] through
//! search → pick room → enter details → confirm. Each operation loads the
//! draft, checks that the transition is legal from the stored state, and
//! writes the next state back. Rendering, flashes and redirects belong to the
//! caller.

use std::sync::Arc;

use domains::{
    BookingDraft, BookingError, DateRange, GuestDetails, NewReservation, Notifier, Reservation,
    Result, Room, RoomId,
};
use tracing::instrument;

use crate::availability::AvailabilityService;
use crate::mail;
use crate::reservations::ReservationService;
use crate::session::Session;

/// Addresses used for the mails sent after a booking commits.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub mail_from: String,
    pub owner_email: String,
}

/// Result of `submit_date_range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Moved to `RangeChosen` with these candidates.
    RoomsAvailable { stay: DateRange, rooms: Vec<Room> },
    /// Stayed in `NoDraft`; nothing is free for `stay`.
    NoAvailability { stay: DateRange },
}

pub struct BookingFlow {
    availability: AvailabilityService,
    reservations: ReservationService,
    notifier: Arc<dyn Notifier>,
    settings: FlowSettings,
}

impl BookingFlow {
    pub fn new(
        availability: AvailabilityService,
        reservations: ReservationService,
        notifier: Arc<dyn Notifier>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            availability,
            reservations,
            notifier,
            settings,
        }
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability
    }

    pub fn reservations(&self) -> &ReservationService {
        &self.reservations
    }

    /// `NoDraft --submitDateRange--> RangeChosen`, or back to `NoDraft` when
    /// the input is bad or no room is free. A failed search always drops the
    /// previous draft.
    #[instrument(skip(self, session))]
    pub async fn submit_date_range(&self, session: &Session, start: &str, end: &str) -> Result<SearchOutcome> {
        let stay = match DateRange::parse(start, end) {
            Ok(stay) => stay,
            Err(err) => {
                session.clear_draft().await?;
                return Err(err);
            }
        };
        let rooms = self.availability.search_all_rooms(stay).await?;

        if rooms.is_empty() {
            session.clear_draft().await?;
            return Ok(SearchOutcome::NoAvailability { stay });
        }

        session
            .put_draft(&BookingDraft::RangeChosen {
                stay,
                rooms: rooms.clone(),
            })
            .await?;
        Ok(SearchOutcome::RoomsAvailable { stay, rooms })
    }

    /// `RangeChosen --chooseRoom--> RoomChosen`. Also accepted from later
    /// states, which re-picks the room for the same stay.
    ///
    /// A room outside the searched candidates is re-checked against the
    /// calendar; if it is not free for the stay the draft is left unchanged
    /// and `RoomNoLongerAvailable` is returned.
    #[instrument(skip(self, session))]
    pub async fn choose_room(&self, session: &Session, room_id: RoomId) -> Result<BookingDraft> {
        let draft = session.draft().await?.ok_or(BookingError::MissingDraft)?;
        let stay = draft.stay();

        let listed = match &draft {
            BookingDraft::RangeChosen { rooms, .. } => rooms.iter().find(|r| r.id == room_id).cloned(),
            _ => None,
        };
        let room = match listed {
            Some(room) => room,
            None => {
                let room = self.availability.room(room_id).await?;
                if !self.availability.is_room_available(room_id, stay).await? {
                    return Err(BookingError::RoomNoLongerAvailable(room_id));
                }
                room
            }
        };

        let next = BookingDraft::RoomChosen {
            stay,
            room,
            entered: None,
        };
        session.put_draft(&next).await?;
        Ok(next)
    }

    /// Shortcut from a room page: seeds `RoomChosen` directly from a room id
    /// and two dates, replacing whatever draft the session held.
    #[instrument(skip(self, session))]
    pub async fn book_room(&self, session: &Session, room_id: RoomId, start: &str, end: &str) -> Result<BookingDraft> {
        let stay = DateRange::parse(start, end)?;
        let room = self.availability.room(room_id).await?;

        let next = BookingDraft::RoomChosen {
            stay,
            room,
            entered: None,
        };
        session.put_draft(&next).await?;
        Ok(next)
    }

    /// The stored draft, for rendering the current step.
    pub async fn current(&self, session: &Session) -> Result<BookingDraft> {
        session.draft().await?.ok_or(BookingError::MissingDraft)
    }

    /// `RoomChosen --enterDetails--> DetailsEntered`. On validation failure
    /// the draft stays in `RoomChosen` and keeps the submitted values.
    #[instrument(skip_all)]
    pub async fn enter_details(&self, session: &Session, guest: GuestDetails) -> Result<BookingDraft> {
        let (stay, room) = match session.draft().await? {
            Some(BookingDraft::RoomChosen { stay, room, .. })
            | Some(BookingDraft::DetailsEntered { stay, room, .. }) => (stay, room),
            Some(BookingDraft::RangeChosen { .. }) | None => return Err(BookingError::MissingDraft),
        };

        if let Err(err) = guest.check() {
            session
                .put_draft(&BookingDraft::RoomChosen {
                    stay,
                    room,
                    entered: Some(guest),
                })
                .await?;
            return Err(err);
        }

        let next = BookingDraft::DetailsEntered { stay, room, guest };
        session.put_draft(&next).await?;
        Ok(next)
    }

    /// `DetailsEntered --confirm--> Committed`.
    ///
    /// If the room was taken meanwhile, the draft falls back to `RangeChosen`
    /// with a freshly queried room list and `RoomNoLongerAvailable` is
    /// returned. Other failures leave the draft untouched so the guest can
    /// resubmit.
    #[instrument(skip_all)]
    pub async fn confirm(&self, session: &Session) -> Result<Reservation> {
        let Some(BookingDraft::DetailsEntered { stay, room, guest }) = session.draft().await? else {
            return Err(BookingError::MissingDraft);
        };

        let request = NewReservation {
            guest,
            room_id: room.id,
            stay,
        };
        match self.reservations.book_reservation(request).await {
            Ok(mut reservation) => {
                reservation.room_name = Some(room.room_name);
                session.clear_draft().await?;
                session.put_confirmation(&reservation).await?;
                self.send_confirmation(&reservation);
                Ok(reservation)
            }
            Err(BookingError::RoomNoLongerAvailable(room_id)) => {
                let rooms = self.availability.search_all_rooms(stay).await?;
                session
                    .put_draft(&BookingDraft::RangeChosen { stay, rooms })
                    .await?;
                Err(BookingError::RoomNoLongerAvailable(room_id))
            }
            Err(err) => Err(err),
        }
    }

    /// The committed reservation, consumed once by the summary page.
    pub async fn summary(&self, session: &Session) -> Result<Reservation> {
        session
            .take_confirmation()
            .await?
            .ok_or(BookingError::MissingDraft)
    }

    fn send_confirmation(&self, reservation: &Reservation) {
        let FlowSettings {
            mail_from,
            owner_email,
        } = &self.settings;
        self.notifier
            .notify(mail::guest_confirmation(reservation, mail_from));
        self.notifier
            .notify(mail::owner_notice(reservation, mail_from, owner_email));
    }
}
