use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use pulsetrack_core::geo::{GeoDriver, GeoDriverError, GeoLookupResult, GeoSource};

/// Remote HTTP geolocation lookups against an ip-api-style JSON endpoint
/// (`GET {base_url}/{ip}`).
///
/// The client timeout is set at construction and must stay strictly below
/// the request SLA so a slow provider degrades into the fallback chain
/// instead of stalling ingestion.
pub struct ApiDriver {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Response shape of ip-api.com and compatible services.
#[derive(Debug, Deserialize)]
struct ApiGeoResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    /// Combined ASN field, e.g. "AS15169 Google LLC".
    #[serde(rename = "as")]
    asn: Option<String>,
}

impl ApiDriver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GeoDriverError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoDriverError::Remote(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl GeoDriver for ApiDriver {
    fn source(&self) -> GeoSource {
        GeoSource::Api
    }

    async fn lookup(&self, ip: IpAddr) -> Result<GeoLookupResult, GeoDriverError> {
        let url = format!("{}/{}", self.base_url, ip);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                GeoDriverError::Timeout(self.timeout.as_millis() as u64)
            } else {
                GeoDriverError::Remote(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(GeoDriverError::Remote(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let body: ApiGeoResponse = response
            .json()
            .await
            .map_err(|e| GeoDriverError::Remote(format!("malformed response: {e}")))?;

        if body.status.as_deref() == Some("fail") {
            return Err(GeoDriverError::NotFound(
                body.message.unwrap_or_else(|| ip.to_string()),
            ));
        }

        let (asn, asn_organization) = body.asn.as_deref().map(parse_asn).unwrap_or((None, None));

        Ok(GeoLookupResult {
            ip: ip.to_string(),
            country: body.country_code,
            region: body.region_name,
            city: body.city,
            asn,
            asn_organization,
            source: GeoSource::Api,
            error: None,
        })
    }
}

/// Split "AS15169 Google LLC" into (15169, "Google LLC").
fn parse_asn(raw: &str) -> (Option<u32>, Option<String>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (None, None);
    }
    let (number_part, org_part) = match trimmed.split_once(' ') {
        Some((n, org)) => (n, Some(org.trim().to_string())),
        None => (trimmed, None),
    };
    let number = number_part.strip_prefix("AS").and_then(|n| n.parse().ok());
    (number, org_part)
}
