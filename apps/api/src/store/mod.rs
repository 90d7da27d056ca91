pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::annotation::anchor::AnchorSet;
use crate::errors::AppError;
use crate::models::association::Association;
use crate::models::image_reference::ImageReference;
use crate::models::moment::ImagedMoment;
use crate::models::observation::Observation;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence seam for the annotation aggregate.
///
/// `resolve_moment` is the one operation with an atomicity contract: for a given
/// `(video_reference_uuid, anchor)` key, concurrent callers must observe exactly
/// one surviving imaged moment. `MemoryStore` serializes the whole
/// resolve-or-create under a write lock; `PgStore` relies on partial unique
/// indexes plus a re-resolve on conflict.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Finds the imaged moment matching any supplied anchor (probed in
    /// precedence order) or creates one holding all supplied anchor fields.
    async fn resolve_moment(
        &self,
        video_reference_uuid: Uuid,
        anchors: &AnchorSet,
    ) -> Result<ImagedMoment, AppError>;

    async fn find_moment(
        &self,
        imaged_moment_uuid: Uuid,
    ) -> Result<Option<ImagedMoment>, AppError>;

    /// Imaged moments for a video, in creation order. Includes orphaned moments.
    async fn list_moments_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImagedMoment>, AppError>;

    async fn insert_observation(&self, observation: &Observation) -> Result<(), AppError>;

    /// Replaces an observation row. When the moment changed, the store marks an
    /// emptied source moment `Orphaned` and revives the target to `Active`.
    async fn update_observation(&self, observation: &Observation) -> Result<(), AppError>;

    async fn find_observation(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Option<Observation>, AppError>;

    /// Observations for a video, ordered by moment creation then observation
    /// creation within each moment.
    async fn list_observations_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<Observation>, AppError>;

    /// Deletes an observation and cascades to its associations. Returns `false`
    /// when the observation did not exist.
    async fn delete_observation(&self, observation_uuid: Uuid) -> Result<bool, AppError>;

    async fn insert_association(&self, association: &Association) -> Result<(), AppError>;

    /// Associations of one observation, in creation order.
    async fn list_associations(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Vec<Association>, AppError>;

    async fn insert_image_reference(&self, image: &ImageReference) -> Result<(), AppError>;

    async fn list_image_references_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImageReference>, AppError>;
}
