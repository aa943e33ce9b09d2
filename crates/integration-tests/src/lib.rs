//! Shared fixtures for the cross-crate tests: an in-memory store seeded with
//! rooms, a recording notifier, and (with `web-axum`) a cookie-keeping
//! client for the router.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use domains::{MailData, Notifier, Room, RoomId, SessionId};
use services::{AvailabilityService, BookingFlow, FlowSettings, ReservationService, Session};
use storage_adapters::{MemorySessionStore, MemoryStore};

pub const STORE_TIMEOUT: Duration = Duration::from_secs(3);
pub const SESSION_LIFETIME: Duration = Duration::from_secs(3600);
pub const OWNER_EMAIL: &str = "owner@bookings.local";
pub const MAIL_FROM: &str = "reservations@bookings.local";

/// Keeps every mail handed to it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<MailData>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<MailData> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, mail: MailData) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mail);
    }
}

/// A store holding only "General's quarters".
pub async fn single_room_store() -> (MemoryStore, Room) {
    let store = MemoryStore::new();
    let room = store.add_room("General's quarters").await;
    (store, room)
}

/// A store holding "General's Quarters" and "Major's Suite", in that order of ids.
pub async fn two_room_store() -> (MemoryStore, Room, Room) {
    let store = MemoryStore::new();
    let quarters = store.add_room("General's Quarters").await;
    let suite = store.add_room("Major's Suite").await;
    (store, quarters, suite)
}

/// A store holding a single room with a fixed id.
pub async fn store_with_room(id: i32, name: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store.add_room_with_id(RoomId(id), name).await;
    store
}

pub fn availability(store: &MemoryStore) -> AvailabilityService {
    AvailabilityService::new(Arc::new(store.clone()), STORE_TIMEOUT)
}

pub fn reservations(store: &MemoryStore) -> ReservationService {
    ReservationService::new(Arc::new(store.clone()), STORE_TIMEOUT)
}

pub fn booking_flow(store: &MemoryStore, notifier: Arc<RecordingNotifier>) -> BookingFlow {
    BookingFlow::new(
        availability(store),
        reservations(store),
        notifier,
        FlowSettings {
            mail_from: MAIL_FROM.to_string(),
            owner_email: OWNER_EMAIL.to_string(),
        },
    )
}

pub fn session_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new(SESSION_LIFETIME))
}

pub fn session(store: &Arc<MemorySessionStore>, id: &str) -> Session {
    Session::new(store.clone(), SessionId::new(id))
}

#[cfg(feature = "web-axum")]
pub mod http {
    //! Drives the router in-process, carrying the session cookie between
    //! requests the way a browser would.

    use std::sync::Arc;

    use api_adapters::{build_router, AppState, CookieSettings, Metrics};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use storage_adapters::MemoryStore;
    use tower::ServiceExt;

    use super::{booking_flow, session_store, RecordingNotifier};

    pub const COOKIE_NAME: &str = "booking_session";

    pub struct TestApp {
        pub router: Router,
        pub notifier: Arc<RecordingNotifier>,
        pub metrics: Arc<Metrics>,
    }

    pub fn test_app(store: &MemoryStore) -> TestApp {
        let notifier = Arc::new(RecordingNotifier::default());
        let metrics = Arc::new(Metrics::new());
        let state = AppState::new(
            booking_flow(store, notifier.clone()),
            session_store(),
            metrics.clone(),
            CookieSettings {
                name: COOKIE_NAME.to_string(),
                secure: false,
            },
        );
        TestApp {
            router: build_router(state),
            notifier,
            metrics,
        }
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub location: Option<String>,
        pub set_cookie: Option<String>,
        pub text: String,
        /// `Null` when the body is empty or not JSON.
        pub json: Value,
    }

    /// A client with its own cookie jar of one cookie.
    pub struct Browser {
        router: Router,
        cookie: Option<String>,
    }

    impl Browser {
        pub fn new(app: &TestApp) -> Self {
            Self {
                router: app.router.clone(),
                cookie: None,
            }
        }

        pub fn cookie(&self) -> Option<&str> {
            self.cookie.as_deref()
        }

        pub async fn get(&mut self, uri: &str) -> TestResponse {
            let request = self.request("GET", uri).body(Body::empty()).unwrap();
            self.send(request).await
        }

        pub async fn post_form(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
            let request = self
                .request("POST", uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(encode_form(form)))
                .unwrap();
            self.send(request).await
        }

        fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
            let builder = Request::builder().method(method).uri(uri);
            match &self.cookie {
                Some(cookie) => builder.header(header::COOKIE, cookie),
                None => builder,
            }
        }

        async fn send(&mut self, request: Request<Body>) -> TestResponse {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let header_str = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let location = header_str(header::LOCATION);
            let set_cookie = header_str(header::SET_COOKIE);
            if let Some(raw) = &set_cookie {
                if let Some(pair) = raw.split(';').next() {
                    self.cookie = Some(pair.trim().to_string());
                }
            }

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            TestResponse {
                status,
                location,
                set_cookie,
                text,
                json,
            }
        }
    }

    pub fn encode_form(form: &[(&str, &str)]) -> String {
        serde_urlencoded::to_string(form).unwrap()
    }
}
