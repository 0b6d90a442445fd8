use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Campaign-scoped context cached by the ingest pipeline. Created on first
/// reference, refreshed on every subsequent one, evicted by expiry only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignContext {
    pub campaign_id: String,
    /// Whatever the loader resolved for this campaign; opaque to the core.
    pub metadata: serde_json::Value,
}

/// External collaborator responsible for fetching durable campaign data on a
/// cache miss. `Ok(None)` means the campaign does not exist; `Err` means the
/// lookup itself failed and will be retried on the next request (load
/// failures are never cached).
#[async_trait]
pub trait CampaignLoader: Send + Sync + 'static {
    async fn load(&self, campaign_id: &str) -> anyhow::Result<Option<CampaignContext>>;
}
