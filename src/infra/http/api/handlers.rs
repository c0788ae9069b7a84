use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use super::error::ApiError;
use super::models::{ContentEventRequest, ContentEventResponse, PurgeOutcomeBody};
use super::state::ApiState;

/// `PUT | POST | PATCH /cpc/v1/purge`: purge the whole zone.
pub async fn purge_endpoint(
    State(state): State<ApiState>,
) -> Result<Json<PurgeOutcomeBody>, ApiError> {
    let outcome = state.service.purge_everything().await?;
    Ok(Json(outcome.into()))
}

pub async fn admin_purge_everything(
    State(state): State<ApiState>,
) -> Result<Json<PurgeOutcomeBody>, ApiError> {
    let outcome = state.service.purge_everything().await?;
    Ok(Json(outcome.into()))
}

pub async fn admin_purge_latest(
    State(state): State<ApiState>,
) -> Result<Json<PurgeOutcomeBody>, ApiError> {
    let outcome = state.service.purge_latest().await?;
    Ok(Json(outcome.into()))
}

pub async fn content_event(
    State(state): State<ApiState>,
    payload: Result<Json<ContentEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(event) = payload
        .map_err(|err| ApiError::bad_request("invalid content event", Some(err.body_text())))?;

    if event.revision {
        debug!(
            target: "purge_cache::http::hooks",
            post_id = event.id,
            "ignoring revision event"
        );
        return Ok((
            StatusCode::ACCEPTED,
            Json(ContentEventResponse {
                id: event.id,
                scheduled: false,
            }),
        ));
    }

    let scheduled = state.scheduler.schedule(event.id);
    Ok((
        StatusCode::ACCEPTED,
        Json(ContentEventResponse {
            id: event.id,
            scheduled,
        }),
    ))
}
