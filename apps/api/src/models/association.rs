use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel `to_concept` meaning "refers to the observation itself".
pub const TO_CONCEPT_SELF: &str = "self";

/// Default media type for `link_value` payloads.
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// Key/value detail attached to an observation, e.g. `eating -> Sergestes`.
///
/// `link_value` is opaque text. Callers may stuff serialized JSON in it; the
/// server stores it verbatim and never parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub association_uuid: Uuid,
    pub observation_uuid: Uuid,
    pub link_name: String,
    pub to_concept: String,
    pub link_value: Option<String>,
    pub mime_type: String,
}
