use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};

use pulsetrack_core::collect::CollectPayload;

use crate::{error::AppError, state::AppState};

/// `POST /api/event` — ingest a named custom event.
///
/// Runs the same gate pipeline as `/api/collect`; the only difference is the
/// mandatory `event_name`, echoed back so the caller can correlate the
/// decision with the event it is about to persist.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CollectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let event_name = payload
        .event_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("event_name is required".to_string()))?
        .to_string();

    let mut body = super::run_pipeline(&state, &payload, &headers).await?;
    if let Some(object) = body.as_object_mut() {
        object.insert("event_name".to_string(), event_name.into());
    }
    Ok((axum::http::StatusCode::ACCEPTED, Json(body)))
}
