use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use pulsetrack_core::error::IngestError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("rate limited")]
    RateLimited,

    /// The shared TTL store is unreachable; the caller decides whether to
    /// retry or record a degraded event elsewhere.
    #[error("store unavailable")]
    StoreUnavailable,

    #[error("campaign load failed: {0}")]
    CampaignLoadFailed(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::UnknownCampaign(id) => {
                AppError::NotFound(format!("Unknown campaign_id: {id}"))
            }
            IngestError::CampaignLoadFailed { campaign_id, source } => {
                tracing::error!(campaign_id = %campaign_id, error = %source, "campaign loader failed");
                AppError::CampaignLoadFailed(campaign_id)
            }
            IngestError::StoreUnavailable(source) => {
                tracing::error!(error = %source, "TTL store unavailable");
                AppError::StoreUnavailable
            }
            IngestError::CorruptRecord(source) => {
                tracing::error!(error = %source, "corrupt record in TTL store");
                AppError::StoreUnavailable
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded".to_string(),
            ),
            AppError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Tracking store is unavailable, retry later".to_string(),
            ),
            AppError::CampaignLoadFailed(campaign_id) => (
                StatusCode::BAD_GATEWAY,
                "campaign_load_failed",
                format!("Campaign data could not be loaded for {campaign_id}"),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        )
            .into_response()
    }
}
