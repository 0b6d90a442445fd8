use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};

use pulsetrack_core::collect::CollectPayload;

use crate::{error::AppError, state::AppState};

/// `POST /api/collect` — ingest a single pageview hit.
///
/// ## Auth
/// None required. Hits for unknown `campaign_id` values are rejected with 404.
/// Called cross-origin from tracked pages; the route carries no session
/// state, so there is no CSRF surface to protect.
///
/// ## Rate limiting
/// Per-IP sliding window (`PULSETRACK_RATE_LIMIT_PER_MINUTE`, default 120)
/// enforced in [`AppState::check_rate_limit`] before any store work.
///
/// ## Response
/// `202 Accepted` with either `{ ok, suppressed: true }` (hit gate closed)
/// or `{ ok, visitor_id, pageview_id, new_visit, geo?, campaign }`.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn collect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CollectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let body = super::run_pipeline(&state, &payload, &headers).await?;
    Ok((axum::http::StatusCode::ACCEPTED, Json(body)))
}
