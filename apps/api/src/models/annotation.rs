use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::association::Association;
use crate::models::moment::ImagedMoment;
use crate::models::observation::Observation;

/// The user-facing composite: one observation plus the anchor fields of its
/// owning imaged moment and any associations. This is the shape the annotation
/// endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    pub observation_uuid: Uuid,
    pub concept: String,
    pub observer: String,
    pub observation_timestamp: DateTime<Utc>,
    pub video_reference_uuid: Uuid,
    pub imaged_moment_uuid: Uuid,
    pub timecode: Option<String>,
    pub elapsed_time_millis: Option<i64>,
    pub recorded_timestamp: Option<DateTime<Utc>>,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
    pub associations: Vec<Association>,
}

impl Annotation {
    pub fn assemble(
        moment: &ImagedMoment,
        observation: Observation,
        associations: Vec<Association>,
    ) -> Self {
        Annotation {
            observation_uuid: observation.observation_uuid,
            concept: observation.concept,
            observer: observation.observer,
            observation_timestamp: observation.observation_timestamp,
            video_reference_uuid: moment.video_reference_uuid,
            imaged_moment_uuid: moment.imaged_moment_uuid,
            timecode: moment.timecode.clone(),
            elapsed_time_millis: moment.elapsed_time_millis,
            recorded_timestamp: moment.recorded_timestamp,
            duration_millis: observation.duration_millis,
            group: observation.group,
            activity: observation.activity,
            associations,
        }
    }
}
