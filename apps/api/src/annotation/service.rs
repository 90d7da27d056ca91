use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::annotation::requests::{CreateAnnotation, UpdateAnnotation};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::annotation::Annotation;
use crate::models::moment::ImagedMoment;
use crate::models::observation::Observation;
use crate::store::AnnotationStore;

/// Creates an annotation: resolves (or creates) the anchor's imaged moment,
/// then attaches a fresh observation to it.
pub async fn create_annotation(
    store: &dyn AnnotationStore,
    clock: &dyn Clock,
    req: CreateAnnotation,
) -> Result<Annotation, AppError> {
    let moment = store
        .resolve_moment(req.video_reference_uuid, &req.anchors)
        .await?;

    let observation = Observation {
        observation_uuid: Uuid::new_v4(),
        imaged_moment_uuid: moment.imaged_moment_uuid,
        concept: req.concept,
        observer: req.observer,
        observation_timestamp: req.observation_timestamp.unwrap_or_else(|| clock.now()),
        duration_millis: req.duration_millis,
        group: req.group,
        activity: req.activity,
    };
    store.insert_observation(&observation).await?;

    info!(
        "Created observation {} on moment {} (video {})",
        observation.observation_uuid, moment.imaged_moment_uuid, moment.video_reference_uuid
    );
    Ok(Annotation::assemble(&moment, observation, Vec::new()))
}

/// Updates an annotation. Any subset of fields may change; if the video or an
/// anchor field changed, anchor resolution runs again against the new key and
/// the observation moves, possibly orphaning its old moment.
///
/// The observation_timestamp is always restamped with server time, even when
/// only unrelated fields changed. That coupling is documented upstream behavior
/// and is kept on purpose.
pub async fn update_annotation(
    store: &dyn AnnotationStore,
    clock: &dyn Clock,
    observation_uuid: Uuid,
    req: UpdateAnnotation,
) -> Result<Annotation, AppError> {
    let mut observation = store
        .find_observation(observation_uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Observation {observation_uuid} not found")))?;
    let current_moment = moment_of(store, &observation).await?;

    let moment = if req.video_reference_uuid.is_some() || req.anchors.is_some() {
        let video_reference_uuid = req
            .video_reference_uuid
            .unwrap_or(current_moment.video_reference_uuid);
        // Moving to another video without new anchor fields keeps the old anchor.
        let anchors = match &req.anchors {
            Some(anchors) => anchors.clone(),
            None => current_moment.anchor_set(),
        };
        store.resolve_moment(video_reference_uuid, &anchors).await?
    } else {
        current_moment
    };

    if moment.imaged_moment_uuid != observation.imaged_moment_uuid {
        info!(
            "Moving observation {observation_uuid} from moment {} to {}",
            observation.imaged_moment_uuid, moment.imaged_moment_uuid
        );
    }

    observation.imaged_moment_uuid = moment.imaged_moment_uuid;
    if let Some(concept) = req.concept {
        observation.concept = concept;
    }
    if let Some(observer) = req.observer {
        observation.observer = observer;
    }
    if let Some(duration_millis) = req.duration_millis {
        observation.duration_millis = Some(duration_millis);
    }
    if let Some(group) = req.group {
        observation.group = Some(group);
    }
    if let Some(activity) = req.activity {
        observation.activity = Some(activity);
    }
    observation.observation_timestamp = clock.now();

    store.update_observation(&observation).await?;
    let associations = store.list_associations(observation_uuid).await?;
    Ok(Annotation::assemble(&moment, observation, associations))
}

/// Point lookup by observation uuid.
pub async fn get_annotation(
    store: &dyn AnnotationStore,
    observation_uuid: Uuid,
) -> Result<Annotation, AppError> {
    let observation = store
        .find_observation(observation_uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Observation {observation_uuid} not found")))?;
    let moment = moment_of(store, &observation).await?;
    let associations = store.list_associations(observation_uuid).await?;
    Ok(Annotation::assemble(&moment, observation, associations))
}

/// Fan-out over a whole video: every observation of every imaged moment, in
/// moment creation order then observation creation order.
pub async fn list_annotations_by_video(
    store: &dyn AnnotationStore,
    video_reference_uuid: Uuid,
) -> Result<Vec<Annotation>, AppError> {
    let moments = store.list_moments_by_video(video_reference_uuid).await?;
    let moments_by_uuid: HashMap<Uuid, &ImagedMoment> = moments
        .iter()
        .map(|m| (m.imaged_moment_uuid, m))
        .collect();

    let observations = store
        .list_observations_by_video(video_reference_uuid)
        .await?;

    let mut annotations = Vec::with_capacity(observations.len());
    for observation in observations {
        let Some(moment) = moments_by_uuid.get(&observation.imaged_moment_uuid) else {
            continue;
        };
        let associations = store
            .list_associations(observation.observation_uuid)
            .await?;
        annotations.push(Annotation::assemble(moment, observation, associations));
    }
    Ok(annotations)
}

async fn moment_of(
    store: &dyn AnnotationStore,
    observation: &Observation,
) -> Result<ImagedMoment, AppError> {
    store
        .find_moment(observation.imaged_moment_uuid)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Observation {} references missing moment {}",
                observation.observation_uuid,
                observation.imaged_moment_uuid
            ))
        })
}
