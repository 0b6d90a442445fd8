use thiserror::Error;

use crate::store::StoreError;

/// Failures the ingestion pipeline surfaces to its caller. Geolocation
/// failures are deliberately absent: they are recovered inside the resolver
/// and reported through the lookup result, never as an error.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cache store unavailable")]
    StoreUnavailable(#[source] StoreError),

    #[error("corrupt cache record")]
    CorruptRecord(#[source] StoreError),

    #[error("campaign load failed for {campaign_id}")]
    CampaignLoadFailed {
        campaign_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown campaign: {0}")]
    UnknownCampaign(String),
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupt { .. } => IngestError::CorruptRecord(e),
            _ => IngestError::StoreUnavailable(e),
        }
    }
}
