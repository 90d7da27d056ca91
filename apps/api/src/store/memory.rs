use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::annotation::anchor::{Anchor, AnchorSet};
use crate::errors::AppError;
use crate::models::association::Association;
use crate::models::image_reference::ImageReference;
use crate::models::moment::{ImagedMoment, MomentLifecycle};
use crate::models::observation::Observation;
use crate::store::AnnotationStore;

/// In-memory store. Used by the test suite and for ephemeral runs; creation
/// order is tracked explicitly so the list queries match the Postgres ordering.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    moments: HashMap<Uuid, ImagedMoment>,
    moment_order: Vec<Uuid>,
    observations: HashMap<Uuid, Observation>,
    observation_order: Vec<Uuid>,
    associations: Vec<Association>,
    images: Vec<ImageReference>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn find_by_anchor(&self, video_reference_uuid: Uuid, anchor: &Anchor) -> Option<&ImagedMoment> {
        self.moment_order
            .iter()
            .filter_map(|uuid| self.moments.get(uuid))
            .filter(|m| m.video_reference_uuid == video_reference_uuid)
            .find(|m| match anchor {
                Anchor::Recorded(t) => m.recorded_timestamp == Some(*t),
                Anchor::Timecode(tc) => m.timecode.as_deref() == Some(tc.as_str()),
                Anchor::Elapsed(ms) => m.elapsed_time_millis == Some(*ms),
            })
    }

    fn observation_count(&self, imaged_moment_uuid: Uuid) -> usize {
        self.observations
            .values()
            .filter(|o| o.imaged_moment_uuid == imaged_moment_uuid)
            .count()
    }

    fn set_lifecycle(&mut self, imaged_moment_uuid: Uuid, lifecycle: MomentLifecycle) {
        if let Some(moment) = self.moments.get_mut(&imaged_moment_uuid) {
            moment.lifecycle = lifecycle;
        }
    }

    /// Orphans the moment if its last observation just left. Orphans are
    /// retained for an out-of-band maintenance sweep.
    fn orphan_if_empty(&mut self, imaged_moment_uuid: Uuid) {
        if self.observation_count(imaged_moment_uuid) == 0 {
            self.set_lifecycle(imaged_moment_uuid, MomentLifecycle::Orphaned);
        }
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn resolve_moment(
        &self,
        video_reference_uuid: Uuid,
        anchors: &AnchorSet,
    ) -> Result<ImagedMoment, AppError> {
        if anchors.is_empty() {
            return Err(AppError::Validation(
                "Cannot resolve an imaged moment without an anchor".to_string(),
            ));
        }

        // Resolve-or-create runs entirely under the write lock, which serializes
        // concurrent requests for the same anchor key.
        let mut inner = self.inner.write().await;
        for anchor in anchors.anchors() {
            if let Some(moment) = inner.find_by_anchor(video_reference_uuid, &anchor) {
                return Ok(moment.clone());
            }
        }

        let moment = ImagedMoment {
            imaged_moment_uuid: Uuid::new_v4(),
            video_reference_uuid,
            recorded_timestamp: anchors.recorded_timestamp,
            elapsed_time_millis: anchors.elapsed_time_millis,
            timecode: anchors.timecode.clone(),
            lifecycle: MomentLifecycle::Active,
        };
        inner.moment_order.push(moment.imaged_moment_uuid);
        inner
            .moments
            .insert(moment.imaged_moment_uuid, moment.clone());
        Ok(moment)
    }

    async fn find_moment(
        &self,
        imaged_moment_uuid: Uuid,
    ) -> Result<Option<ImagedMoment>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.moments.get(&imaged_moment_uuid).cloned())
    }

    async fn list_moments_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImagedMoment>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .moment_order
            .iter()
            .filter_map(|uuid| inner.moments.get(uuid))
            .filter(|m| m.video_reference_uuid == video_reference_uuid)
            .cloned()
            .collect())
    }

    async fn insert_observation(&self, observation: &Observation) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.set_lifecycle(observation.imaged_moment_uuid, MomentLifecycle::Active);
        inner.observation_order.push(observation.observation_uuid);
        inner
            .observations
            .insert(observation.observation_uuid, observation.clone());
        Ok(())
    }

    async fn update_observation(&self, observation: &Observation) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let previous_moment = inner
            .observations
            .get(&observation.observation_uuid)
            .map(|o| o.imaged_moment_uuid)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Observation {} not found",
                    observation.observation_uuid
                ))
            })?;

        inner
            .observations
            .insert(observation.observation_uuid, observation.clone());

        if previous_moment != observation.imaged_moment_uuid {
            inner.set_lifecycle(observation.imaged_moment_uuid, MomentLifecycle::Active);
            inner.orphan_if_empty(previous_moment);
        }
        Ok(())
    }

    async fn find_observation(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Option<Observation>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.observations.get(&observation_uuid).cloned())
    }

    async fn list_observations_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<Observation>, AppError> {
        let inner = self.inner.read().await;
        let mut result = Vec::new();
        for moment_uuid in &inner.moment_order {
            let Some(moment) = inner.moments.get(moment_uuid) else {
                continue;
            };
            if moment.video_reference_uuid != video_reference_uuid {
                continue;
            }
            for obs_uuid in &inner.observation_order {
                if let Some(obs) = inner.observations.get(obs_uuid) {
                    if obs.imaged_moment_uuid == *moment_uuid {
                        result.push(obs.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    async fn delete_observation(&self, observation_uuid: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let Some(observation) = inner.observations.remove(&observation_uuid) else {
            return Ok(false);
        };
        inner.observation_order.retain(|u| *u != observation_uuid);
        inner
            .associations
            .retain(|a| a.observation_uuid != observation_uuid);
        inner.orphan_if_empty(observation.imaged_moment_uuid);
        Ok(true)
    }

    async fn insert_association(&self, association: &Association) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.associations.push(association.clone());
        Ok(())
    }

    async fn list_associations(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Vec<Association>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .associations
            .iter()
            .filter(|a| a.observation_uuid == observation_uuid)
            .cloned()
            .collect())
    }

    async fn insert_image_reference(&self, image: &ImageReference) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.images.push(image.clone());
        Ok(())
    }

    async fn list_image_references_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImageReference>, AppError> {
        let inner = self.inner.read().await;
        let moment_uuids: Vec<Uuid> = inner
            .moments
            .values()
            .filter(|m| m.video_reference_uuid == video_reference_uuid)
            .map(|m| m.imaged_moment_uuid)
            .collect();
        Ok(inner
            .images
            .iter()
            .filter(|i| moment_uuids.contains(&i.imaged_moment_uuid))
            .cloned()
            .collect())
    }
}
