use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::annotation::anchor::{parse_timestamp, AnchorSet};
use crate::errors::AppError;

/// Raw form body for `POST /v1/annotations`. All values arrive as form-encoded
/// strings; validation turns them into a typed `CreateAnnotation`.
#[derive(Debug, Deserialize)]
pub struct CreateAnnotationForm {
    pub video_reference_uuid: Uuid,
    pub concept: String,
    pub observer: String,
    pub observation_timestamp: Option<String>,
    pub recorded_timestamp: Option<String>,
    pub timecode: Option<String>,
    pub elapsed_time_millis: Option<i64>,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
}

/// Validated create request.
#[derive(Debug, Clone)]
pub struct CreateAnnotation {
    pub video_reference_uuid: Uuid,
    pub concept: String,
    pub observer: String,
    pub observation_timestamp: Option<DateTime<Utc>>,
    pub anchors: AnchorSet,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
}

impl CreateAnnotationForm {
    pub fn validate(self) -> Result<CreateAnnotation, AppError> {
        let concept = require_text("concept", &self.concept)?;
        let observer = require_text("observer", &self.observer)?;

        let anchors = AnchorSet::from_fields(
            self.recorded_timestamp.as_deref(),
            self.timecode.as_deref(),
            self.elapsed_time_millis,
        )?
        .ok_or_else(|| {
            AppError::Validation(
                "At least one of recorded_timestamp, elapsed_time_millis or timecode is required"
                    .to_string(),
            )
        })?;

        let observation_timestamp = self
            .observation_timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(CreateAnnotation {
            video_reference_uuid: self.video_reference_uuid,
            concept,
            observer,
            observation_timestamp,
            anchors,
            duration_millis: self.duration_millis,
            group: self.group,
            activity: self.activity,
        })
    }
}

/// Raw form body for `PUT /v1/annotations/:observation_uuid`. Every field is
/// optional; the target is named by the path. A body `observation_uuid` is
/// tolerated for clients that mirror it into the form, but the path wins.
#[derive(Debug, Deserialize)]
pub struct UpdateAnnotationForm {
    #[allow(dead_code)]
    pub observation_uuid: Option<Uuid>,
    pub video_reference_uuid: Option<Uuid>,
    pub concept: Option<String>,
    pub observer: Option<String>,
    // Accepted from clients but discarded: updates always restamp the
    // observation_timestamp with server time. See annotation::service.
    #[allow(dead_code)]
    pub observation_timestamp: Option<String>,
    pub recorded_timestamp: Option<String>,
    pub timecode: Option<String>,
    pub elapsed_time_millis: Option<i64>,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
}

/// Validated update request. `anchors` is `None` when no anchor field was
/// supplied, i.e. the observation stays where it is unless the video moved.
#[derive(Debug, Clone, Default)]
pub struct UpdateAnnotation {
    pub video_reference_uuid: Option<Uuid>,
    pub concept: Option<String>,
    pub observer: Option<String>,
    pub anchors: Option<AnchorSet>,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
}

impl UpdateAnnotationForm {
    pub fn validate(self) -> Result<UpdateAnnotation, AppError> {
        let concept = self
            .concept
            .as_deref()
            .map(|c| require_text("concept", c))
            .transpose()?;
        let observer = self
            .observer
            .as_deref()
            .map(|o| require_text("observer", o))
            .transpose()?;

        let anchors = AnchorSet::from_fields(
            self.recorded_timestamp.as_deref(),
            self.timecode.as_deref(),
            self.elapsed_time_millis,
        )?;

        Ok(UpdateAnnotation {
            video_reference_uuid: self.video_reference_uuid,
            concept,
            observer,
            anchors,
            duration_millis: self.duration_millis,
            group: self.group,
            activity: self.activity,
        })
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("'{field}' must not be empty")));
    }
    Ok(trimmed.to_string())
}
