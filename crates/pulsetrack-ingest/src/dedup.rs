use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use pulsetrack_core::keys;
use pulsetrack_core::pageview::PageviewRecord;
use pulsetrack_core::store::{Created, StoreError, TtlStore};

/// Result of a pageview lookup-or-create.
pub struct DedupResult {
    pub record: PageviewRecord,
    pub is_new: bool,
}

/// Decides whether a collect reuses an existing pageview identity or mints a
/// new one, bounded by the dedup window.
///
/// A hit on a live record refreshes its TTL to the full window (sliding —
/// continued activity keeps the identity alive). A miss mints a fresh
/// identity through the atomic create; when two first-touch requests race,
/// exactly one wins and the loser adopts the winner's record.
pub struct PageviewDedupGate {
    store: Arc<dyn TtlStore>,
    prefix: String,
    create_ttl: Duration,
    dedup_window: Duration,
}

impl PageviewDedupGate {
    pub fn new(
        store: Arc<dyn TtlStore>,
        prefix: impl Into<String>,
        create_ttl: Duration,
        dedup_window: Duration,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            create_ttl,
            dedup_window,
        }
    }

    pub async fn resolve(
        &self,
        campaign_id: &str,
        visitor_id: &str,
    ) -> Result<DedupResult, StoreError> {
        let key = keys::pageview(&self.prefix, campaign_id, visitor_id);

        if let Some(raw) = self.store.get(&key).await? {
            let record = parse_record(&raw, &key)?;
            self.store.refresh(&key, self.dedup_window).await?;
            return Ok(DedupResult {
                record,
                is_new: false,
            });
        }

        let fresh = PageviewRecord::mint(Utc::now());
        let raw = serde_json::to_string(&fresh).map_err(|_| StoreError::Corrupt {
            key: key.clone(),
        })?;

        match self.store.create_if_absent(&key, &raw, self.create_ttl).await? {
            Created::Won => Ok(DedupResult {
                record: fresh,
                is_new: true,
            }),
            // Lost the first-touch race; the winner's identity is the live one.
            Created::Lost(current) => Ok(DedupResult {
                record: parse_record(&current, &key)?,
                is_new: false,
            }),
        }
    }
}

fn parse_record(raw: &str, key: &str) -> Result<PageviewRecord, StoreError> {
    serde_json::from_str(raw).map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
    })
}
