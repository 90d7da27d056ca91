use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured image registered against a video reference, anchored through an
/// imaged moment exactly like an observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReference {
    pub image_reference_uuid: Uuid,
    pub imaged_moment_uuid: Uuid,
    pub url: String,
    pub width_pixels: Option<i32>,
    pub height_pixels: Option<i32>,
    pub format: Option<String>,
    pub description: Option<String>,
}
