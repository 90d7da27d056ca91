use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotation::anchor::AnchorSet;

/// Lifecycle of an imaged moment.
///
/// A moment whose last observation has been moved away becomes `Orphaned`. It is
/// retained for an out-of-band maintenance sweep, never deleted here, and is
/// revived to `Active` if a later observation lands on the same anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentLifecycle {
    Active,
    Orphaned,
}

impl MomentLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentLifecycle::Active => "active",
            MomentLifecycle::Orphaned => "orphaned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(MomentLifecycle::Active),
            "orphaned" => Some(MomentLifecycle::Orphaned),
            _ => None,
        }
    }
}

/// The temporal anchor container within a video reference.
///
/// One moment owns every observation and image reference recorded at its
/// position. Creation is always implicit via anchor resolution; see
/// `annotation::anchor` for the dedup rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagedMoment {
    pub imaged_moment_uuid: Uuid,
    pub video_reference_uuid: Uuid,
    pub recorded_timestamp: Option<DateTime<Utc>>,
    pub elapsed_time_millis: Option<i64>,
    pub timecode: Option<String>,
    pub lifecycle: MomentLifecycle,
}

impl ImagedMoment {
    /// The anchor fields currently known for this moment, in `AnchorSet` form.
    /// Used when an update changes the video but not the anchor.
    pub fn anchor_set(&self) -> AnchorSet {
        AnchorSet {
            recorded_timestamp: self.recorded_timestamp,
            timecode: self.timecode.clone(),
            elapsed_time_millis: self.elapsed_time_millis,
        }
    }
}
