use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use pulsetrack_core::config::{Config, GeoDriverKind};
use pulsetrack_core::geo::{GeoDriver, GeoLookupResult};

use crate::{ApiDriver, MaxMindDriver};

/// Ordered driver fallback chain, fixed at startup.
///
/// `resolve` never fails: an exhausted chain (or an unparseable IP) yields a
/// result with `source = none` carrying the last error, so the caller can
/// always record a pageview without geolocation.
pub struct GeoResolver {
    chain: Vec<Arc<dyn GeoDriver>>,
}

impl GeoResolver {
    pub fn new(chain: Vec<Arc<dyn GeoDriver>>) -> Self {
        Self { chain }
    }

    /// Build the primary/fallback chain from configuration.
    ///
    /// A driver that cannot be constructed (missing database file, bad
    /// endpoint) is dropped from the chain with a warning rather than
    /// aborting startup; lookups then degrade to the remaining drivers or to
    /// unresolved results.
    pub fn from_config(config: &Config) -> Self {
        let mut kinds = vec![config.geo_driver];
        if let Some(fallback) = config.geo_fallback {
            if fallback != config.geo_driver {
                kinds.push(fallback);
            }
        }

        let mut chain: Vec<Arc<dyn GeoDriver>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match kind {
                GeoDriverKind::MaxMind => {
                    match MaxMindDriver::open(&config.geo_city_db_path, &config.geo_asn_db_path) {
                        Ok(driver) => chain.push(Arc::new(driver)),
                        Err(e) => tracing::warn!(
                            city_db = %config.geo_city_db_path,
                            error = %e,
                            "maxmind driver unavailable, dropped from geolocation chain"
                        ),
                    }
                }
                GeoDriverKind::Api => {
                    match ApiDriver::new(&config.geo_api_url, config.geo_api_timeout()) {
                        Ok(driver) => chain.push(Arc::new(driver)),
                        Err(e) => tracing::warn!(
                            api_url = %config.geo_api_url,
                            error = %e,
                            "api driver unavailable, dropped from geolocation chain"
                        ),
                    }
                }
            }
        }

        if chain.is_empty() {
            tracing::warn!("no geolocation driver available; lookups will be unresolved");
        }
        Self { chain }
    }

    pub async fn resolve(&self, ip: &str) -> GeoLookupResult {
        let parsed = match IpAddr::from_str(ip) {
            Ok(addr) => addr,
            Err(_) => return GeoLookupResult::unresolved(ip, format!("invalid ip address: {ip}")),
        };

        let mut last_error = "no geolocation driver configured".to_string();
        for driver in &self.chain {
            match driver.lookup(parsed).await {
                Ok(result) => return result,
                Err(e) => {
                    tracing::debug!(source = %driver.source(), error = %e, "geolocation driver failed, trying next");
                    last_error = e.to_string();
                }
            }
        }
        GeoLookupResult::unresolved(ip, last_error)
    }
}
