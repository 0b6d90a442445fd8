pub mod collect;
pub mod event;
pub mod health;

use axum::http::HeaderMap;
use serde_json::{json, Value};

use pulsetrack_core::collect::{validate_identifier, CollectOutcome, CollectPayload};

use crate::error::AppError;
use crate::state::AppState;

/// Extract the real client IP from `X-Forwarded-For` (first entry).
///
/// Falls back to `"unknown"` when the header is absent, which keeps the
/// pipeline total: an unknown IP simply yields an unresolved geolocation.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Validate identifiers and fill in a derived visitor ID when the client did
/// not send one.
pub(crate) fn resolve_visitor_id(
    payload: &CollectPayload,
    client_ip: &str,
    headers: &HeaderMap,
) -> Result<String, AppError> {
    validate_identifier("campaign_id", &payload.campaign_id).map_err(AppError::BadRequest)?;

    match &payload.visitor_id {
        Some(visitor_id) => {
            validate_identifier("visitor_id", visitor_id).map_err(AppError::BadRequest)?;
            Ok(visitor_id.clone())
        }
        None => {
            let user_agent = headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            Ok(pulsetrack_core::visitor::compute_visitor_id(
                client_ip, user_agent,
            ))
        }
    }
}

/// Run the gate pipeline for one request and shape the JSON response body.
pub(crate) async fn run_pipeline(
    state: &AppState,
    payload: &CollectPayload,
    headers: &HeaderMap,
) -> Result<Value, AppError> {
    let client_ip = extract_client_ip(headers);

    if !state.check_rate_limit(&client_ip).await {
        return Err(AppError::RateLimited);
    }

    let visitor_id = resolve_visitor_id(payload, &client_ip, headers)?;

    let outcome = state
        .pipeline
        .process(&payload.campaign_id, &visitor_id, &client_ip)
        .await?;

    Ok(match outcome {
        CollectOutcome::Suppressed => json!({
            "ok": true,
            "suppressed": true,
        }),
        CollectOutcome::Accepted(accepted) => json!({
            "ok": true,
            "suppressed": false,
            "visitor_id": visitor_id,
            "pageview_id": accepted.pageview_id,
            "new_visit": accepted.is_new,
            "first_seen": accepted.first_seen,
            "geo": accepted.geo,
            "campaign": accepted.campaign,
        }),
    })
}
