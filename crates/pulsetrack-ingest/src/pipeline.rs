use std::sync::Arc;

use tracing::{debug, warn};

use pulsetrack_core::campaign::CampaignLoader;
use pulsetrack_core::collect::{AcceptedCollect, CollectOutcome};
use pulsetrack_core::config::Config;
use pulsetrack_core::error::IngestError;
use pulsetrack_core::store::TtlStore;
use pulsetrack_geo::GeoResolver;

use crate::{CampaignContextStore, HitRateGate, PageviewDedupGate};

/// Composes the gates, the geolocation resolver and the campaign cache into
/// one decision per incoming collect/event request.
///
/// The pipeline holds no mutable state; all shared state lives in the TTL
/// store, so it is safe to call concurrently from every request handler.
pub struct IngestPipeline {
    hit_gate: HitRateGate,
    dedup: PageviewDedupGate,
    campaigns: CampaignContextStore,
    geo: GeoResolver,
    loader: Arc<dyn CampaignLoader>,
    hit_gate_fail_open: bool,
}

impl IngestPipeline {
    pub fn new(
        config: &Config,
        store: Arc<dyn TtlStore>,
        geo: GeoResolver,
        loader: Arc<dyn CampaignLoader>,
    ) -> Self {
        let prefix = config.redis_prefix.clone();
        Self {
            hit_gate: HitRateGate::new(Arc::clone(&store), prefix.clone(), config.hit_gate_ttl()),
            dedup: PageviewDedupGate::new(
                Arc::clone(&store),
                prefix.clone(),
                config.pageview_ttl(),
                config.dedup_window(),
            ),
            campaigns: CampaignContextStore::new(store, prefix, config.campaign_ttl()),
            geo,
            loader,
            hit_gate_fail_open: config.hit_gate_fail_open,
        }
    }

    /// One decision for one inbound request.
    ///
    /// Suppression short-circuits everything else; geolocation runs once per
    /// new pageview and never aborts the pipeline; store failures in the
    /// dedup or campaign steps surface as [`IngestError`]. A store failure
    /// in the hit gate goes through the configured fail-open/fail-closed
    /// policy instead — suppressing real traffic on an outage loses data,
    /// so the default admits and logs.
    #[tracing::instrument(skip(self))]
    pub async fn process(
        &self,
        campaign_id: &str,
        visitor_id: &str,
        ip: &str,
    ) -> Result<CollectOutcome, IngestError> {
        let admitted = match self.hit_gate.admit(campaign_id, visitor_id).await {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(
                    error = %e,
                    fail_open = self.hit_gate_fail_open,
                    "hit gate store failure, applying configured policy"
                );
                self.hit_gate_fail_open
            }
        };
        if !admitted {
            debug!("hit suppressed inside cooldown window");
            return Ok(CollectOutcome::Suppressed);
        }

        let resolved = self.dedup.resolve(campaign_id, visitor_id).await?;

        let geo = if resolved.is_new {
            Some(self.geo.resolve(ip).await)
        } else {
            None
        };

        let campaign = self
            .campaigns
            .get_or_load(campaign_id, self.loader.as_ref())
            .await?;

        Ok(CollectOutcome::Accepted(AcceptedCollect {
            pageview_id: resolved.record.pageview_id,
            is_new: resolved.is_new,
            first_seen: resolved.record.first_seen,
            geo,
            campaign,
        }))
    }
}
