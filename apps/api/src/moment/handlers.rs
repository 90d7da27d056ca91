use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::moment::ImagedMoment;
use crate::state::AppState;
use crate::store::AnnotationStore;

/// GET /v1/imagedmoments/videoreference/:video_reference_uuid
///
/// Raw view of the anchor containers for a video, orphans included. Useful for
/// inspecting what anchor dedup actually did.
pub async fn handle_list_moments_by_video(
    State(state): State<AppState>,
    Path(video_reference_uuid): Path<Uuid>,
) -> Result<Json<Vec<ImagedMoment>>, AppError> {
    let moments = state
        .store
        .list_moments_by_video(video_reference_uuid)
        .await?;
    Ok(Json(moments))
}
