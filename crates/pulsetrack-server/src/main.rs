use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use pulsetrack_core::config::Config;
use pulsetrack_geo::GeoResolver;
use pulsetrack_ingest::IngestPipeline;
use pulsetrack_redis::RedisStore;
use pulsetrack_server::campaign::RegistryLoader;
use pulsetrack_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pulsetrack=info".parse()?),
        )
        .json()
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // The initial Redis handshake must succeed; after that the connection
    // manager reconnects on its own and per-command timeouts bound every
    // round trip.
    let store = RedisStore::connect(&config.redis_url, config.store_timeout())
        .await
        .map_err(|e| anyhow::anyhow!("redis connection failed: {e}"))?;
    info!(redis_url = %config.redis_url, prefix = %config.redis_prefix, "TTL store connected");

    if !std::path::Path::new(&config.geo_city_db_path).exists() {
        tracing::warn!(
            city_db = %config.geo_city_db_path,
            "GeoIP City database not found. The maxmind driver will be dropped \
             from the geolocation chain; set PULSETRACK_GEO_CITY_DB_PATH or rely \
             on the api driver."
        );
    }

    // Driver chain is fixed here, at startup — never re-dispatched per request.
    let geo = GeoResolver::from_config(&config);

    let loader = Arc::new(RegistryLoader::new(config.campaigns.clone()));
    info!(campaigns = config.campaigns.len(), "campaign registry seeded");

    let pipeline = IngestPipeline::new(&config, Arc::new(store), geo, loader);

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(pipeline, config.clone()));
    let app = pulsetrack_server::app::build_app(Arc::clone(&state));

    info!(port = config.port, "Pulsetrack listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
