use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::annotation::requests::require_text;
use crate::errors::AppError;
use crate::models::association::{Association, DEFAULT_MIME_TYPE, TO_CONCEPT_SELF};
use crate::store::AnnotationStore;

/// Form body for `POST /v1/associations`.
#[derive(Debug, Deserialize)]
pub struct CreateAssociationForm {
    pub observation_uuid: Uuid,
    pub link_name: String,
    pub to_concept: Option<String>,
    pub link_value: Option<String>,
    pub mime_type: Option<String>,
}

/// Creates an association on an existing observation. `link_value` is stored
/// verbatim; callers are free to embed serialized payloads in it.
pub async fn create_association(
    store: &dyn AnnotationStore,
    form: CreateAssociationForm,
) -> Result<Association, AppError> {
    let link_name = require_text("link_name", &form.link_name)?;

    store
        .find_observation(form.observation_uuid)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Observation {} not found", form.observation_uuid))
        })?;

    let association = Association {
        association_uuid: Uuid::new_v4(),
        observation_uuid: form.observation_uuid,
        link_name,
        to_concept: form
            .to_concept
            .unwrap_or_else(|| TO_CONCEPT_SELF.to_string()),
        link_value: form.link_value,
        mime_type: form
            .mime_type
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
    };
    store.insert_association(&association).await?;

    info!(
        "Created association {} ({}) on observation {}",
        association.association_uuid, association.link_name, association.observation_uuid
    );
    Ok(association)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::observation::Observation;
    use crate::store::MemoryStore;

    async fn seeded_observation(store: &MemoryStore) -> Uuid {
        let observation = Observation {
            observation_uuid: Uuid::new_v4(),
            imaged_moment_uuid: Uuid::new_v4(),
            concept: "Nanomia bijuga".to_string(),
            observer: "brian".to_string(),
            observation_timestamp: Utc::now(),
            duration_millis: None,
            group: None,
            activity: None,
        };
        store.insert_observation(&observation).await.unwrap();
        observation.observation_uuid
    }

    #[tokio::test]
    async fn minimal_association_gets_sentinel_defaults() {
        let store = MemoryStore::new();
        let observation_uuid = seeded_observation(&store).await;

        let association = create_association(
            &store,
            CreateAssociationForm {
                observation_uuid,
                link_name: "swimming".to_string(),
                to_concept: None,
                link_value: None,
                mime_type: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(association.to_concept, "self");
        assert_eq!(association.mime_type, "text/plain");
        assert!(association.link_value.is_none());
    }

    #[tokio::test]
    async fn link_value_is_stored_verbatim_even_when_it_looks_like_json() {
        let store = MemoryStore::new();
        let observation_uuid = seeded_observation(&store).await;

        // Deliberately truncated JSON; the server must not care.
        let raw = r#"{"x0": 100, "y0: 89", "x1"#;
        let association = create_association(
            &store,
            CreateAssociationForm {
                observation_uuid,
                link_name: "distance measurement".to_string(),
                to_concept: Some("self".to_string()),
                link_value: Some(raw.to_string()),
                mime_type: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(association.link_value.as_deref(), Some(raw));

        let stored = store.list_associations(observation_uuid).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].link_value.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn unknown_observation_is_not_found() {
        let store = MemoryStore::new();
        let err = create_association(
            &store,
            CreateAssociationForm {
                observation_uuid: Uuid::new_v4(),
                link_name: "swimming".to_string(),
                to_concept: None,
                link_value: None,
                mime_type: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_link_name_is_a_validation_error() {
        let store = MemoryStore::new();
        let observation_uuid = seeded_observation(&store).await;
        let err = create_association(
            &store,
            CreateAssociationForm {
                observation_uuid,
                link_name: "  ".to_string(),
                to_concept: None,
                link_value: None,
                mime_type: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
