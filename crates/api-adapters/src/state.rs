use std::sync::Arc;

use domains::SessionStore;
use services::BookingFlow;

use crate::metrics::Metrics;

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "booking_session".to_string(),
            secure: false,
        }
    }
}

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<BookingFlow>,
    pub sessions: Arc<dyn SessionStore>,
    pub metrics: Arc<Metrics>,
    pub cookie: Arc<CookieSettings>,
}

impl AppState {
    pub fn new(
        flow: BookingFlow,
        sessions: Arc<dyn SessionStore>,
        metrics: Arc<Metrics>,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            flow: Arc::new(flow),
            sessions,
            metrics,
            cookie: Arc::new(cookie),
        }
    }
}
