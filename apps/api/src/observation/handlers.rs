use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::observation::service::{self, ObservationDetail};
use crate::state::AppState;

/// GET /v1/observations/:observation_uuid
pub async fn handle_get_observation(
    State(state): State<AppState>,
    Path(observation_uuid): Path<Uuid>,
) -> Result<Json<ObservationDetail>, AppError> {
    let detail = service::get_observation(state.store.as_ref(), observation_uuid).await?;
    Ok(Json(detail))
}

/// GET /v1/observations/videoreference/:video_reference_uuid
pub async fn handle_list_observations_by_video(
    State(state): State<AppState>,
    Path(video_reference_uuid): Path<Uuid>,
) -> Result<Json<Vec<ObservationDetail>>, AppError> {
    let details =
        service::list_observations_by_video(state.store.as_ref(), video_reference_uuid).await?;
    Ok(Json(details))
}

/// DELETE /v1/observations/:observation_uuid
pub async fn handle_delete_observation(
    State(state): State<AppState>,
    Path(observation_uuid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete_observation(state.store.as_ref(), observation_uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}
