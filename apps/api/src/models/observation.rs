use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sighting attached to an imaged moment.
///
/// `observation_timestamp` records when the human (or process) made the call,
/// not when the frame was recorded; it defaults to server time on create and is
/// always reset to server time on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub observation_uuid: Uuid,
    pub imaged_moment_uuid: Uuid,
    pub concept: String,
    pub observer: String,
    pub observation_timestamp: DateTime<Utc>,
    pub duration_millis: Option<i64>,
    pub group: Option<String>,
    pub activity: Option<String>,
}
