//! TTL key-value store abstraction.
//!
//! All shared mutable state lives behind this trait; the gates in the ingest
//! crate are race-free exactly as far as [`TtlStore::create_if_absent`] is
//! atomic. Implementations must guarantee that when two concurrent callers
//! race on the same absent key, exactly one observes [`Created::Won`] and
//! every other caller observes the winner's value.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is unreachable or a command failed. Never conflated with
    /// "key not found".
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store command timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// A value under `key` failed to deserialize. Surfaced instead of being
    /// treated as absent so callers never silently re-mint identity state.
    #[error("corrupt record under key {key}")]
    Corrupt { key: String },
}

/// Result of an atomic create-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    /// This caller created the entry.
    Won,
    /// A live entry already existed; carries its current value.
    Lost(String),
}

impl Created {
    pub fn won(&self) -> bool {
        matches!(self, Created::Won)
    }
}

#[async_trait]
pub trait TtlStore: Send + Sync + 'static {
    /// Atomically create `key` with `value` and `ttl` unless a live entry
    /// exists. Exactly one concurrent caller wins.
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Created, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Reset the TTL of a live entry. Returns `false` when the key no longer
    /// exists.
    async fn refresh(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
}
