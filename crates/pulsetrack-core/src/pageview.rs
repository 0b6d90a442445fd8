use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identity record stored under the pageview key. At most one live
/// record exists per `(campaign_id, visitor_id)` pair; collects inside the
/// dedup window resolve to the same `pageview_id`. Recency is encoded by the
/// sliding TTL, not by a persisted timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageviewRecord {
    pub pageview_id: String,
    pub first_seen: DateTime<Utc>,
}

impl PageviewRecord {
    /// Mint a fresh identity for a first-touch collect.
    pub fn mint(now: DateTime<Utc>) -> Self {
        Self {
            pageview_id: uuid::Uuid::new_v4().to_string(),
            first_seen: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_unique() {
        let now = Utc::now();
        assert_ne!(
            PageviewRecord::mint(now).pageview_id,
            PageviewRecord::mint(now).pageview_id
        );
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = PageviewRecord::mint(Utc::now());
        let raw = serde_json::to_string(&record).expect("serialize record");
        let parsed: PageviewRecord = serde_json::from_str(&raw).expect("parse record");
        assert_eq!(parsed, record);
    }
}
