//! Concurrent in-process session store with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use domains::{Result, SessionId, SessionStore};
use serde_json::Value;
use tokio::task::JoinHandle;

struct Entry {
    values: HashMap<String, Value>,
    last_seen: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            last_seen: Instant::now(),
        }
    }

    fn expired(&self, lifetime: Duration) -> bool {
        self.last_seen.elapsed() > lifetime
    }
}

/// Sessions idle for longer than `lifetime` are treated as empty and
/// eventually removed by [`MemorySessionStore::purge_expired`].
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, Entry>,
    lifetime: Duration,
}

impl MemorySessionStore {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            lifetime,
        }
    }

    /// Drops every expired session, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.expired(self.lifetime));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Background task purging expired sessions every `every`.
    pub fn spawn_reaper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "expired sessions removed");
                }
            }
        })
    }

    /// Live entry for `session`, if any. An expired entry is removed first
    /// so stale values never leak into a new visit.
    fn live(&self, session: &SessionId) -> Option<RefMut<'_, SessionId, Entry>> {
        self.sessions
            .remove_if(session, |_, entry| entry.expired(self.lifetime));
        let mut entry = self.sessions.get_mut(session)?;
        entry.last_seen = Instant::now();
        Some(entry)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: &SessionId, key: &str, value: Value) -> Result<()> {
        self.sessions
            .remove_if(session, |_, entry| entry.expired(self.lifetime));
        let mut entry = self.sessions.entry(session.clone()).or_insert_with(Entry::new);
        entry.last_seen = Instant::now();
        entry.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<Value>> {
        Ok(self
            .live(session)
            .and_then(|entry| entry.values.get(key).cloned()))
    }

    async fn pop(&self, session: &SessionId, key: &str) -> Result<Option<Value>> {
        Ok(self
            .live(session)
            .and_then(|mut entry| entry.values.remove(key)))
    }
}
