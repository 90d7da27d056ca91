use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use uuid::Uuid;

use crate::annotation::requests::{CreateAnnotationForm, UpdateAnnotationForm};
use crate::annotation::service;
use crate::errors::AppError;
use crate::models::annotation::Annotation;
use crate::state::AppState;

/// POST /v1/annotations
pub async fn handle_create_annotation(
    State(state): State<AppState>,
    Form(form): Form<CreateAnnotationForm>,
) -> Result<(StatusCode, Json<Annotation>), AppError> {
    let req = form.validate()?;
    let annotation =
        service::create_annotation(state.store.as_ref(), state.clock.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(annotation)))
}

/// PUT /v1/annotations/:observation_uuid
pub async fn handle_update_annotation(
    State(state): State<AppState>,
    Path(observation_uuid): Path<Uuid>,
    Form(form): Form<UpdateAnnotationForm>,
) -> Result<Json<Annotation>, AppError> {
    let req = form.validate()?;
    let annotation = service::update_annotation(
        state.store.as_ref(),
        state.clock.as_ref(),
        observation_uuid,
        req,
    )
    .await?;
    Ok(Json(annotation))
}

/// GET /v1/annotations/:observation_uuid
pub async fn handle_get_annotation(
    State(state): State<AppState>,
    Path(observation_uuid): Path<Uuid>,
) -> Result<Json<Annotation>, AppError> {
    let annotation = service::get_annotation(state.store.as_ref(), observation_uuid).await?;
    Ok(Json(annotation))
}

/// GET /v1/annotations/videoreference/:video_reference_uuid
pub async fn handle_list_annotations_by_video(
    State(state): State<AppState>,
    Path(video_reference_uuid): Path<Uuid>,
) -> Result<Json<Vec<Annotation>>, AppError> {
    let annotations =
        service::list_annotations_by_video(state.store.as_ref(), video_reference_uuid).await?;
    Ok(Json(annotations))
}
