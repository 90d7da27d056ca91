use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::annotation::anchor::AnchorSet;
use crate::annotation::requests::require_text;
use crate::errors::AppError;
use crate::models::image_reference::ImageReference;
use crate::store::AnnotationStore;

/// Form body for `POST /v1/images`. Images are anchored exactly like
/// observations, so the same three-way anchor fields apply.
#[derive(Debug, Deserialize)]
pub struct CreateImageForm {
    pub video_reference_uuid: Uuid,
    pub url: String,
    pub recorded_timestamp: Option<String>,
    pub timecode: Option<String>,
    pub elapsed_time_millis: Option<i64>,
    pub width_pixels: Option<i32>,
    pub height_pixels: Option<i32>,
    pub format: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageReferenceResponse {
    #[serde(flatten)]
    pub image: ImageReference,
    pub video_reference_uuid: Uuid,
}

/// Registers an image against a video, reusing the anchor's imaged moment when
/// one already exists so images and observations at the same instant share it.
pub async fn create_image_reference(
    store: &dyn AnnotationStore,
    form: CreateImageForm,
) -> Result<ImageReferenceResponse, AppError> {
    let url = require_text("url", &form.url)?;
    let anchors = AnchorSet::from_fields(
        form.recorded_timestamp.as_deref(),
        form.timecode.as_deref(),
        form.elapsed_time_millis,
    )?
    .ok_or_else(|| {
        AppError::Validation(
            "At least one of recorded_timestamp, elapsed_time_millis or timecode is required"
                .to_string(),
        )
    })?;

    let moment = store
        .resolve_moment(form.video_reference_uuid, &anchors)
        .await?;

    let image = ImageReference {
        image_reference_uuid: Uuid::new_v4(),
        imaged_moment_uuid: moment.imaged_moment_uuid,
        url,
        width_pixels: form.width_pixels,
        height_pixels: form.height_pixels,
        format: form.format,
        description: form.description,
    };
    store.insert_image_reference(&image).await?;

    info!(
        "Registered image {} on moment {} (video {})",
        image.image_reference_uuid, moment.imaged_moment_uuid, moment.video_reference_uuid
    );
    Ok(ImageReferenceResponse {
        image,
        video_reference_uuid: moment.video_reference_uuid,
    })
}
