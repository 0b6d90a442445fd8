use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pulsetrack_core::campaign::{CampaignContext, CampaignLoader};
use pulsetrack_core::collect::CollectOutcome;
use pulsetrack_core::config::{Config, GeoDriverKind};
use pulsetrack_core::error::IngestError;
use pulsetrack_core::geo::{GeoDriver, GeoDriverError, GeoLookupResult, GeoSource};
use pulsetrack_core::store::{Created, StoreError, TtlStore};
use pulsetrack_geo::GeoResolver;
use pulsetrack_ingest::IngestPipeline;
use pulsetrack_redis::MemoryStore;

/// Windows from the reference scenario: dedup 86400s, min interval 30s,
/// gate TTL 90s.
fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        redis_prefix: "pt_test".to_string(),
        campaign_ttl_seconds: 3600,
        pageview_ttl_seconds: 86400,
        dedup_window_seconds: 86400,
        min_hit_interval_seconds: 30,
        hit_gate_ttl_seconds: 90,
        hit_gate_fail_open: true,
        store_timeout_ms: 2000,
        geo_driver: GeoDriverKind::MaxMind,
        geo_fallback: Some(GeoDriverKind::Api),
        geo_city_db_path: "/nonexistent/GeoLite2-City.mmdb".to_string(),
        geo_asn_db_path: "/nonexistent/GeoLite2-ASN.mmdb".to_string(),
        geo_api_url: "http://ip-api.com/json".to_string(),
        geo_api_timeout_ms: 1500,
        cors_origins: vec![],
        rate_limit_per_minute: 120,
        rate_limit_disable: true,
        campaigns: vec!["c1".to_string()],
    }
}

struct TestLoader {
    known: Vec<&'static str>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl TestLoader {
    fn new(known: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            known: known.to_vec(),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl CampaignLoader for TestLoader {
    async fn load(&self, campaign_id: &str) -> anyhow::Result<Option<CampaignContext>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("campaign database unreachable");
        }
        if !self.known.contains(&campaign_id) {
            return Ok(None);
        }
        Ok(Some(CampaignContext {
            campaign_id: campaign_id.to_string(),
            metadata: serde_json::json!({ "name": campaign_id }),
        }))
    }
}

struct StaticGeoDriver {
    source: GeoSource,
    country: &'static str,
}

#[async_trait]
impl GeoDriver for StaticGeoDriver {
    fn source(&self) -> GeoSource {
        self.source
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoLookupResult, GeoDriverError> {
        Ok(GeoLookupResult {
            ip: ip.to_string(),
            country: Some(self.country.to_string()),
            region: None,
            city: None,
            asn: Some(64512),
            asn_organization: Some("Test Networks".to_string()),
            source: self.source,
            error: None,
        })
    }
}

struct FailingGeoDriver;

#[async_trait]
impl GeoDriver for FailingGeoDriver {
    fn source(&self) -> GeoSource {
        GeoSource::MaxMind
    }

    async fn lookup(&self, _ip: IpAddr) -> Result<GeoLookupResult, GeoDriverError> {
        Err(GeoDriverError::Database("database file missing".to_string()))
    }
}

/// Store double for outage scenarios: every call fails.
struct FailingStore;

#[async_trait]
impl TtlStore for FailingStore {
    async fn create_if_absent(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<Created, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn refresh(&self, _key: &str, _ttl: Duration) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn pipeline_with(
    config: &Config,
    store: Arc<dyn TtlStore>,
    chain: Vec<Arc<dyn GeoDriver>>,
    loader: Arc<TestLoader>,
) -> IngestPipeline {
    IngestPipeline::new(config, store, GeoResolver::new(chain), loader)
}

fn accepted(outcome: CollectOutcome) -> pulsetrack_core::collect::AcceptedCollect {
    match outcome {
        CollectOutcome::Accepted(a) => a,
        CollectOutcome::Suppressed => panic!("expected accepted outcome, got suppressed"),
    }
}

// ============================================================
// Reference scenario: campaign C1, visitor V1, dedup 86400s,
// min interval 30s, gate TTL 90s.
// ============================================================

#[tokio::test(start_paused = true)]
async fn reference_timing_scenario() {
    let config = test_config();
    let loader = TestLoader::new(&["C1"]);
    let pipeline = pipeline_with(
        &config,
        Arc::new(MemoryStore::new()),
        vec![Arc::new(StaticGeoDriver {
            source: GeoSource::MaxMind,
            country: "DE",
        })],
        loader,
    );

    // t=0: new pageview, admitted.
    let t0 = accepted(pipeline.process("C1", "V1", "203.0.113.9").await.expect("t=0"));
    assert!(t0.is_new);
    assert!(t0.geo.is_some());

    // t=5: inside the 30s cooldown — suppressed before any identity work.
    tokio::time::advance(Duration::from_secs(5)).await;
    let t5 = pipeline.process("C1", "V1", "203.0.113.9").await.expect("t=5");
    assert!(matches!(t5, CollectOutcome::Suppressed));

    // t=100: gate expired (90s), dedup window still open — same identity,
    // no second geolocation lookup.
    tokio::time::advance(Duration::from_secs(95)).await;
    let t100 = accepted(pipeline.process("C1", "V1", "203.0.113.9").await.expect("t=100"));
    assert!(!t100.is_new);
    assert_eq!(t100.pageview_id, t0.pageview_id);
    assert!(t100.geo.is_none());

    // t=90000: dedup window expired — fresh identity, admitted.
    tokio::time::advance(Duration::from_secs(89900)).await;
    let t90000 = accepted(
        pipeline
            .process("C1", "V1", "203.0.113.9")
            .await
            .expect("t=90000"),
    );
    assert!(t90000.is_new);
    assert_ne!(t90000.pageview_id, t0.pageview_id);
}

// ============================================================
// Geolocation behavior through the pipeline
// ============================================================

#[tokio::test(start_paused = true)]
async fn failed_primary_uses_fallback_source() {
    let config = test_config();
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(
        &config,
        Arc::new(MemoryStore::new()),
        vec![
            Arc::new(FailingGeoDriver),
            Arc::new(StaticGeoDriver {
                source: GeoSource::Api,
                country: "FR",
            }),
        ],
        loader,
    );

    let outcome = accepted(pipeline.process("c1", "v1", "203.0.113.9").await.expect("process"));
    let geo = outcome.geo.expect("geo attached to new pageview");
    assert_eq!(geo.source, GeoSource::Api);
    assert_eq!(geo.country.as_deref(), Some("FR"));
}

#[tokio::test(start_paused = true)]
async fn all_drivers_failing_still_returns_outcome() {
    let config = test_config();
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(
        &config,
        Arc::new(MemoryStore::new()),
        vec![Arc::new(FailingGeoDriver)],
        loader,
    );

    let outcome = accepted(pipeline.process("c1", "v1", "203.0.113.9").await.expect("process"));
    let geo = outcome.geo.expect("unresolved geo still attached");
    assert_eq!(geo.source, GeoSource::None);
    assert!(geo.error.is_some());
    assert!(geo.country.is_none());
}

// ============================================================
// Campaign context caching
// ============================================================

#[tokio::test(start_paused = true)]
async fn campaign_context_is_loaded_once_per_ttl() {
    let config = test_config();
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(
        &config,
        Arc::new(MemoryStore::new()),
        vec![],
        Arc::clone(&loader),
    );

    accepted(pipeline.process("c1", "v1", "203.0.113.9").await.expect("first"));
    // A different visitor outside any gate window still hits the cached context.
    accepted(pipeline.process("c1", "v2", "203.0.113.10").await.expect("second"));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    // Past the campaign TTL the loader runs again.
    tokio::time::advance(Duration::from_secs(3601)).await;
    accepted(pipeline.process("c1", "v3", "203.0.113.11").await.expect("third"));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn loader_failure_surfaces_and_is_not_cached() {
    let config = test_config();
    let loader = TestLoader::new(&["c1"]);
    loader.failing.store(true, Ordering::SeqCst);
    let pipeline = pipeline_with(
        &config,
        Arc::new(MemoryStore::new()),
        vec![],
        Arc::clone(&loader),
    );

    let err = pipeline
        .process("c1", "v1", "203.0.113.9")
        .await
        .expect_err("loader failure must surface");
    assert!(matches!(err, IngestError::CampaignLoadFailed { .. }));

    // Recovery: no negative cache, the next request retries and succeeds.
    loader.failing.store(false, Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(91)).await; // past the gate cooldown
    let outcome = pipeline.process("c1", "v1", "203.0.113.9").await.expect("retry");
    assert!(matches!(outcome, CollectOutcome::Accepted(_)));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_campaign_is_a_typed_failure() {
    let config = test_config();
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(&config, Arc::new(MemoryStore::new()), vec![], loader);

    let err = pipeline
        .process("ghost", "v1", "203.0.113.9")
        .await
        .expect_err("unknown campaign must surface");
    assert!(matches!(err, IngestError::UnknownCampaign(id) if id == "ghost"));
}

// ============================================================
// Store outage
// ============================================================

#[tokio::test(start_paused = true)]
async fn store_outage_surfaces_as_store_unavailable() {
    let config = test_config(); // hit_gate_fail_open = true
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(&config, Arc::new(FailingStore), vec![], loader);

    // Gate fails open, then the dedup step hits the same outage and surfaces it.
    let err = pipeline
        .process("c1", "v1", "203.0.113.9")
        .await
        .expect_err("dedup store failure must surface");
    assert!(matches!(err, IngestError::StoreUnavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn fail_closed_gate_suppresses_during_outage() {
    let mut config = test_config();
    config.hit_gate_fail_open = false;
    let loader = TestLoader::new(&["c1"]);
    let pipeline = pipeline_with(&config, Arc::new(FailingStore), vec![], loader);

    let outcome = pipeline
        .process("c1", "v1", "203.0.113.9")
        .await
        .expect("fail-closed gate suppresses instead of erroring");
    assert!(matches!(outcome, CollectOutcome::Suppressed));
}
