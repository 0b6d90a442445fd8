use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignContext;
use crate::geo::GeoLookupResult;

/// The payload the tracker script sends to POST /api/collect and
/// POST /api/event.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectPayload {
    pub campaign_id: String,
    /// Client-persisted visitor ID. When absent the server derives one from
    /// IP and User-Agent.
    pub visitor_id: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    /// Required on /api/event, absent on /api/collect.
    pub event_name: Option<String>,
}

/// One decision per incoming collect/event request.
#[derive(Debug, Clone)]
pub enum CollectOutcome {
    /// The hit gate rejected the request inside the cooldown window. No
    /// identity was resolved and no geolocation lookup ran.
    Suppressed,
    Accepted(AcceptedCollect),
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedCollect {
    pub pageview_id: String,
    pub is_new: bool,
    pub first_seen: DateTime<Utc>,
    /// Present only when `is_new` — deduplicated pageviews reuse the lookup
    /// already attached to their original record downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoLookupResult>,
    pub campaign: CampaignContext,
}

/// Maximum accepted length for campaign and visitor identifiers.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Identifiers become cache key segments, so they must be non-empty, bounded
/// and free of the `:` separator and control characters.
pub fn validate_identifier(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(format!("{name} exceeds {MAX_IDENTIFIER_LEN} characters"));
    }
    if value
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err(format!(
            "{name} must not contain ':', whitespace or control characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass() {
        assert!(validate_identifier("campaign_id", "campaign_default").is_ok());
        assert!(validate_identifier("visitor_id", "a1b2c3d4e5f60718").is_ok());
    }

    #[test]
    fn separator_and_empty_rejected() {
        assert!(validate_identifier("campaign_id", "").is_err());
        assert!(validate_identifier("campaign_id", "c:1").is_err());
        assert!(validate_identifier("visitor_id", "v 1").is_err());
    }

    #[test]
    fn oversized_identifier_rejected() {
        let long = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_identifier("visitor_id", &long).is_err());
    }
}
