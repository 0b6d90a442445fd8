use std::sync::Arc;
use std::time::Duration;

use pulsetrack_core::keys;
use pulsetrack_core::store::{StoreError, TtlStore};

/// Rejects repeated hits from the same `(campaign_id, visitor_id)` pair
/// inside the cooldown window.
///
/// One atomic create-if-absent per decision: winning the create means the
/// hit is admitted and the entry now blocks the pair until its TTL expires.
/// A live entry is never overwritten, so the window is exactly the
/// configured TTL. There is no distinction between a first-ever hit and a
/// hit after cooldown.
pub struct HitRateGate {
    store: Arc<dyn TtlStore>,
    prefix: String,
    ttl: Duration,
}

impl HitRateGate {
    pub fn new(store: Arc<dyn TtlStore>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
        }
    }

    /// `Ok(true)` admits the hit, `Ok(false)` suppresses it. Store failures
    /// surface untouched; the fail-open/fail-closed policy belongs to the
    /// orchestrator, where it is applied against explicit configuration.
    pub async fn admit(&self, campaign_id: &str, visitor_id: &str) -> Result<bool, StoreError> {
        let key = keys::hit_gate(&self.prefix, campaign_id, visitor_id);
        let created = self.store.create_if_absent(&key, "1", self.ttl).await?;
        Ok(created.won())
    }
}
