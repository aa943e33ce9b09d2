//! # Session
//!
//! Typed access to one browser session's scratch area. Handlers build one per
//! request from the session cookie and hand it to the booking flow.

use std::sync::Arc;

use domains::{BookingDraft, BookingError, Reservation, Result, SessionId, SessionStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DRAFT_KEY: &str = "reservation";
const CONFIRMATION_KEY: &str = "confirmation";
const FLASH_ERROR_KEY: &str = "error";
const FLASH_NOTICE_KEY: &str = "flash";

#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    id: SessionId,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Error(String),
    Notice(String),
}

/// Flash messages popped for a single page render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashes {
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>, id: SessionId) -> Self {
        Self { store, id }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub async fn draft(&self) -> Result<Option<BookingDraft>> {
        self.read(DRAFT_KEY).await
    }

    pub async fn put_draft(&self, draft: &BookingDraft) -> Result<()> {
        self.write(DRAFT_KEY, draft).await
    }

    pub async fn clear_draft(&self) -> Result<()> {
        self.store.pop(&self.id, DRAFT_KEY).await.map(|_| ())
    }

    pub async fn put_confirmation(&self, reservation: &Reservation) -> Result<()> {
        self.write(CONFIRMATION_KEY, reservation).await
    }

    /// The confirmed reservation, consumed by the summary page.
    pub async fn take_confirmation(&self) -> Result<Option<Reservation>> {
        let value = self.store.pop(&self.id, CONFIRMATION_KEY).await?;
        Ok(value.and_then(|v| decode(CONFIRMATION_KEY, v)))
    }

    pub async fn flash(&self, flash: Flash) -> Result<()> {
        match flash {
            Flash::Error(msg) => self.write(FLASH_ERROR_KEY, &msg).await,
            Flash::Notice(msg) => self.write(FLASH_NOTICE_KEY, &msg).await,
        }
    }

    pub async fn take_flashes(&self) -> Result<Flashes> {
        let error = self.store.pop(&self.id, FLASH_ERROR_KEY).await?;
        let notice = self.store.pop(&self.id, FLASH_NOTICE_KEY).await?;
        Ok(Flashes {
            error: error.and_then(|v| decode(FLASH_ERROR_KEY, v)),
            notice: notice.and_then(|v| decode(FLASH_NOTICE_KEY, v)),
        })
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = self.store.get(&self.id, key).await?;
        Ok(value.and_then(|v| decode(key, v)))
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(BookingError::storage)?;
        self.store.put(&self.id, key, value).await
    }
}

/// Unreadable values (e.g. written by an older release) count as absent.
fn decode<T: DeserializeOwned>(key: &str, value: serde_json::Value) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|err| tracing::warn!(key, error = %err, "discarding unreadable session value"))
        .ok()
}
