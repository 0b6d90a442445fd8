use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::json;

use pulsetrack_core::campaign::{CampaignContext, CampaignLoader};

/// In-process [`CampaignLoader`] backed by the campaign ids seeded from
/// configuration.
///
/// Stands in for the durable campaign database that lives outside this
/// service: known ids resolve to a minimal context, unknown ids resolve to
/// `None` so the pipeline rejects them. Swapping in a database-backed loader
/// leaves the pipeline and handlers unchanged.
pub struct RegistryLoader {
    known: HashSet<String>,
}

impl RegistryLoader {
    pub fn new(campaign_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            known: campaign_ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CampaignLoader for RegistryLoader {
    async fn load(&self, campaign_id: &str) -> anyhow::Result<Option<CampaignContext>> {
        if !self.known.contains(campaign_id) {
            return Ok(None);
        }
        Ok(Some(CampaignContext {
            campaign_id: campaign_id.to_string(),
            metadata: json!({ "name": campaign_id, "source": "registry" }),
        }))
    }
}
