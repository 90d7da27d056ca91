use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::association::Association;
use crate::models::observation::Observation;
use crate::store::AnnotationStore;

/// Observation plus its associations, the shape the lower-level observation
/// endpoints return. Unlike `Annotation` it carries no anchor fields.
#[derive(Debug, Serialize)]
pub struct ObservationDetail {
    #[serde(flatten)]
    pub observation: Observation,
    pub associations: Vec<Association>,
}

pub async fn get_observation(
    store: &dyn AnnotationStore,
    observation_uuid: Uuid,
) -> Result<ObservationDetail, AppError> {
    let observation = store
        .find_observation(observation_uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Observation {observation_uuid} not found")))?;
    let associations = store.list_associations(observation_uuid).await?;
    Ok(ObservationDetail {
        observation,
        associations,
    })
}

pub async fn list_observations_by_video(
    store: &dyn AnnotationStore,
    video_reference_uuid: Uuid,
) -> Result<Vec<ObservationDetail>, AppError> {
    let observations = store
        .list_observations_by_video(video_reference_uuid)
        .await?;
    let mut details = Vec::with_capacity(observations.len());
    for observation in observations {
        let associations = store
            .list_associations(observation.observation_uuid)
            .await?;
        details.push(ObservationDetail {
            observation,
            associations,
        });
    }
    Ok(details)
}

/// The only delete surface of the service. Cascades to the observation's
/// associations; an emptied moment is orphaned, not removed.
pub async fn delete_observation(
    store: &dyn AnnotationStore,
    observation_uuid: Uuid,
) -> Result<(), AppError> {
    let deleted = store.delete_observation(observation_uuid).await?;
    if !deleted {
        return Err(AppError::NotFound(format!(
            "Observation {observation_uuid} not found"
        )));
    }
    info!("Deleted observation {observation_uuid}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::annotation::anchor::AnchorSet;
    use crate::annotation::requests::CreateAnnotation;
    use crate::annotation::service::create_annotation;
    use crate::association::service::{create_association, CreateAssociationForm};
    use crate::clock::ManualClock;
    use crate::models::moment::MomentLifecycle;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, video: Uuid) -> Uuid {
        let clock = ManualClock::new(
            "2016-07-28T14:29:01.030Z"
                .parse::<DateTime<Utc>>()
                .unwrap(),
        );
        create_annotation(
            store,
            &clock,
            CreateAnnotation {
                video_reference_uuid: video,
                concept: "Nanomia bijuga".to_string(),
                observer: "brian".to_string(),
                observation_timestamp: None,
                anchors: AnchorSet {
                    elapsed_time_millis: Some(12345),
                    ..Default::default()
                },
                duration_millis: None,
                group: None,
                activity: None,
            },
        )
        .await
        .unwrap()
        .observation_uuid
    }

    #[tokio::test]
    async fn get_returns_observation_with_its_associations() {
        let store = MemoryStore::new();
        let observation_uuid = seed(&store, Uuid::new_v4()).await;
        create_association(
            &store,
            CreateAssociationForm {
                observation_uuid,
                link_name: "surface color".to_string(),
                to_concept: None,
                link_value: Some("red".to_string()),
                mime_type: None,
            },
        )
        .await
        .unwrap();

        let detail = get_observation(&store, observation_uuid).await.unwrap();
        assert_eq!(detail.observation.observation_uuid, observation_uuid);
        assert_eq!(detail.associations.len(), 1);
        assert_eq!(detail.associations[0].link_name, "surface color");
    }

    #[tokio::test]
    async fn get_unknown_observation_is_not_found() {
        let store = MemoryStore::new();
        let err = get_observation(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_cascades_associations_and_orphans_the_moment() {
        let store = MemoryStore::new();
        let video = Uuid::new_v4();
        let observation_uuid = seed(&store, video).await;
        create_association(
            &store,
            CreateAssociationForm {
                observation_uuid,
                link_name: "eating".to_string(),
                to_concept: Some("Sergestes".to_string()),
                link_value: None,
                mime_type: None,
            },
        )
        .await
        .unwrap();

        delete_observation(&store, observation_uuid).await.unwrap();

        assert!(store
            .find_observation(observation_uuid)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .list_associations(observation_uuid)
            .await
            .unwrap()
            .is_empty());
        let moments = store.list_moments_by_video(video).await.unwrap();
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].lifecycle, MomentLifecycle::Orphaned);
    }

    #[tokio::test]
    async fn delete_unknown_observation_is_not_found() {
        let store = MemoryStore::new();
        let err = delete_observation(&store, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
