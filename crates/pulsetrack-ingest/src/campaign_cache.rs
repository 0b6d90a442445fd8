use std::sync::Arc;
use std::time::Duration;

use pulsetrack_core::campaign::{CampaignContext, CampaignLoader};
use pulsetrack_core::error::IngestError;
use pulsetrack_core::keys;
use pulsetrack_core::store::{Created, StoreError, TtlStore};

/// Cache-aside store for campaign-scoped context.
///
/// Fast path: live cached context, TTL refreshed on every reference. Slow
/// path: the supplied loader resolves the campaign and the result is cached
/// with the campaign TTL. Loader failures are surfaced and never cached, so
/// the next request retries the load.
pub struct CampaignContextStore {
    store: Arc<dyn TtlStore>,
    prefix: String,
    ttl: Duration,
}

impl CampaignContextStore {
    pub fn new(store: Arc<dyn TtlStore>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub async fn get_or_load(
        &self,
        campaign_id: &str,
        loader: &dyn CampaignLoader,
    ) -> Result<CampaignContext, IngestError> {
        let key = keys::campaign(&self.prefix, campaign_id);

        if let Some(raw) = self.store.get(&key).await.map_err(IngestError::from)? {
            let context = parse_context(&raw, &key)?;
            self.store
                .refresh(&key, self.ttl)
                .await
                .map_err(IngestError::from)?;
            return Ok(context);
        }

        let loaded = loader
            .load(campaign_id)
            .await
            .map_err(|source| IngestError::CampaignLoadFailed {
                campaign_id: campaign_id.to_string(),
                source,
            })?
            .ok_or_else(|| IngestError::UnknownCampaign(campaign_id.to_string()))?;

        let raw = serde_json::to_string(&loaded).map_err(|_| {
            IngestError::CorruptRecord(StoreError::Corrupt { key: key.clone() })
        })?;

        match self
            .store
            .create_if_absent(&key, &raw, self.ttl)
            .await
            .map_err(IngestError::from)?
        {
            Created::Won => Ok(loaded),
            Created::Lost(current) => parse_context(&current, &key),
        }
    }
}

fn parse_context(raw: &str, key: &str) -> Result<CampaignContext, IngestError> {
    serde_json::from_str(raw).map_err(|_| {
        IngestError::CorruptRecord(StoreError::Corrupt {
            key: key.to_string(),
        })
    })
}
