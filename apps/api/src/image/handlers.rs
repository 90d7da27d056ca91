use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::image::service::{self, CreateImageForm, ImageReferenceResponse};
use crate::models::image_reference::ImageReference;
use crate::state::AppState;
use crate::store::AnnotationStore;

/// POST /v1/images
pub async fn handle_create_image(
    State(state): State<AppState>,
    Form(form): Form<CreateImageForm>,
) -> Result<(StatusCode, Json<ImageReferenceResponse>), AppError> {
    let image = service::create_image_reference(state.store.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// GET /v1/images/videoreference/:video_reference_uuid
pub async fn handle_list_images_by_video(
    State(state): State<AppState>,
    Path(video_reference_uuid): Path<Uuid>,
) -> Result<Json<Vec<ImageReference>>, AppError> {
    let images = state
        .store
        .list_image_references_by_video(video_reference_uuid)
        .await?;
    Ok(Json(images))
}
