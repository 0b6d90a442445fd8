//! Geolocation driver capability and result types.

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which driver produced a lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSource {
    MaxMind,
    Api,
    /// Every configured driver failed (or none is configured); the result
    /// carries the last error instead of location data.
    None,
}

impl std::fmt::Display for GeoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GeoSource::MaxMind => "maxmind",
            GeoSource::Api => "api",
            GeoSource::None => "none",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLookupResult {
    pub ip: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub asn: Option<u32>,
    pub asn_organization: Option<String>,
    pub source: GeoSource,
    /// Populated only when `source` is [`GeoSource::None`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeoLookupResult {
    /// An empty result for `ip` with the failure that exhausted the chain.
    pub fn unresolved(ip: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            country: None,
            region: None,
            city: None,
            asn: None,
            asn_organization: None,
            source: GeoSource::None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoDriverError {
    #[error("database lookup failed: {0}")]
    Database(String),

    #[error("no geolocation record for {0}")]
    NotFound(String),

    #[error("remote lookup failed: {0}")]
    Remote(String),

    #[error("remote lookup timed out after {0}ms")]
    Timeout(u64),
}

/// One provider in the fallback chain. Selected once at startup from
/// configuration, never re-dispatched per request.
#[async_trait]
pub trait GeoDriver: Send + Sync + 'static {
    fn source(&self) -> GeoSource;

    async fn lookup(&self, ip: IpAddr) -> Result<GeoLookupResult, GeoDriverError>;
}
