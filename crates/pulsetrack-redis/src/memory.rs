use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use pulsetrack_core::store::{Created, StoreError, TtlStore};

/// In-process [`TtlStore`] with the same single-winner semantics as
/// [`crate::RedisStore`].
///
/// Entries are `(value, deadline)` pairs behind one mutex; the winner of a
/// `create_if_absent` race is whoever takes the lock first. Deadlines use
/// `tokio::time::Instant`, so tests running under a paused clock can drive
/// expiry with `tokio::time::advance`.
///
/// Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    deadline: Instant,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Created, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(key) {
            if existing.live(now) {
                return Ok(Created::Lost(existing.value.clone()));
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                deadline: now + ttl,
            },
        );
        Ok(Created::Won)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn refresh(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.live(now) => {
                entry.deadline = now + ttl;
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
