use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::annotation::anchor::{Anchor, AnchorSet};
use crate::errors::AppError;
use crate::models::association::Association;
use crate::models::image_reference::ImageReference;
use crate::models::moment::{ImagedMoment, MomentLifecycle};
use crate::models::observation::Observation;
use crate::store::AnnotationStore;

/// PostgreSQL-backed store. Schema lives in `migrations/`.
///
/// Anchor dedup is enforced by partial unique indexes on
/// `(video_reference_uuid, <anchor column>)`; a lost creation race surfaces as a
/// unique violation, which triggers exactly one re-resolve before giving up
/// with `Conflict`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_anchors(
        &self,
        video_reference_uuid: Uuid,
        anchors: &AnchorSet,
    ) -> Result<Option<ImagedMoment>, AppError> {
        for anchor in anchors.anchors() {
            let row: Option<MomentRow> = match anchor {
                Anchor::Recorded(t) => {
                    sqlx::query_as(
                        "SELECT * FROM imaged_moments \
                         WHERE video_reference_uuid = $1 AND recorded_timestamp = $2",
                    )
                    .bind(video_reference_uuid)
                    .bind(t)
                    .fetch_optional(&self.pool)
                    .await?
                }
                Anchor::Timecode(tc) => {
                    sqlx::query_as(
                        "SELECT * FROM imaged_moments \
                         WHERE video_reference_uuid = $1 AND timecode = $2",
                    )
                    .bind(video_reference_uuid)
                    .bind(tc)
                    .fetch_optional(&self.pool)
                    .await?
                }
                Anchor::Elapsed(ms) => {
                    sqlx::query_as(
                        "SELECT * FROM imaged_moments \
                         WHERE video_reference_uuid = $1 AND elapsed_time_millis = $2",
                    )
                    .bind(video_reference_uuid)
                    .bind(ms)
                    .fetch_optional(&self.pool)
                    .await?
                }
            };
            if let Some(row) = row {
                return Ok(Some(row.into_moment()?));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AnnotationStore for PgStore {
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

        let mut raced = false;
        loop {
            if let Some(moment) = self.find_by_anchors(video_reference_uuid, anchors).await? {
                return Ok(moment);
            }

            let imaged_moment_uuid = Uuid::new_v4();
            let inserted = sqlx::query(
                "INSERT INTO imaged_moments \
                     (uuid, video_reference_uuid, recorded_timestamp, elapsed_time_millis, timecode, lifecycle) \
                 VALUES ($1, $2, $3, $4, $5, 'active')",
            )
            .bind(imaged_moment_uuid)
            .bind(video_reference_uuid)
            .bind(anchors.recorded_timestamp)
            .bind(anchors.elapsed_time_millis)
            .bind(&anchors.timecode)
            .execute(&self.pool)
            .await;

            match inserted {
                Ok(_) => {
                    return Ok(ImagedMoment {
                        imaged_moment_uuid,
                        video_reference_uuid,
                        recorded_timestamp: anchors.recorded_timestamp,
                        elapsed_time_millis: anchors.elapsed_time_millis,
                        timecode: anchors.timecode.clone(),
                        lifecycle: MomentLifecycle::Active,
                    });
                }
                Err(e) if is_unique_violation(&e) && !raced => {
                    // Lost the creation race; the winner's row must exist now.
                    info!("Anchor key raced for video {video_reference_uuid}, re-resolving");
                    raced = true;
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(AppError::Conflict(format!(
                        "Concurrent anchor creation for video {video_reference_uuid} could not be resolved"
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn find_moment(
        &self,
        imaged_moment_uuid: Uuid,
    ) -> Result<Option<ImagedMoment>, AppError> {
        let row: Option<MomentRow> = sqlx::query_as("SELECT * FROM imaged_moments WHERE uuid = $1")
            .bind(imaged_moment_uuid)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MomentRow::into_moment).transpose()
    }

    async fn list_moments_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImagedMoment>, AppError> {
        let rows: Vec<MomentRow> = sqlx::query_as(
            "SELECT * FROM imaged_moments WHERE video_reference_uuid = $1 ORDER BY seq ASC",
        )
        .bind(video_reference_uuid)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MomentRow::into_moment).collect()
    }

    async fn insert_observation(&self, observation: &Observation) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO observations \
                 (uuid, imaged_moment_uuid, concept, observer, observation_timestamp, \
                  duration_millis, observation_group, activity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(observation.observation_uuid)
        .bind(observation.imaged_moment_uuid)
        .bind(&observation.concept)
        .bind(&observation.observer)
        .bind(observation.observation_timestamp)
        .bind(observation.duration_millis)
        .bind(&observation.group)
        .bind(&observation.activity)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE imaged_moments SET lifecycle = 'active' WHERE uuid = $1")
            .bind(observation.imaged_moment_uuid)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_observation(&self, observation: &Observation) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let previous_moment: Option<Uuid> =
            sqlx::query_scalar("SELECT imaged_moment_uuid FROM observations WHERE uuid = $1")
                .bind(observation.observation_uuid)
                .fetch_optional(&mut *tx)
                .await?;
        let previous_moment = previous_moment.ok_or_else(|| {
            AppError::NotFound(format!(
                "Observation {} not found",
                observation.observation_uuid
            ))
        })?;

        sqlx::query(
            "UPDATE observations SET \
                 imaged_moment_uuid = $2, concept = $3, observer = $4, \
                 observation_timestamp = $5, duration_millis = $6, \
                 observation_group = $7, activity = $8 \
             WHERE uuid = $1",
        )
        .bind(observation.observation_uuid)
        .bind(observation.imaged_moment_uuid)
        .bind(&observation.concept)
        .bind(&observation.observer)
        .bind(observation.observation_timestamp)
        .bind(observation.duration_millis)
        .bind(&observation.group)
        .bind(&observation.activity)
        .execute(&mut *tx)
        .await?;

        if previous_moment != observation.imaged_moment_uuid {
            sqlx::query("UPDATE imaged_moments SET lifecycle = 'active' WHERE uuid = $1")
                .bind(observation.imaged_moment_uuid)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "UPDATE imaged_moments SET lifecycle = 'orphaned' \
                 WHERE uuid = $1 \
                   AND NOT EXISTS (SELECT 1 FROM observations WHERE imaged_moment_uuid = $1)",
            )
            .bind(previous_moment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_observation(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Option<Observation>, AppError> {
        let row: Option<ObservationRow> =
            sqlx::query_as("SELECT * FROM observations WHERE uuid = $1")
                .bind(observation_uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(ObservationRow::into_observation))
    }

    async fn list_observations_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<Observation>, AppError> {
        let rows: Vec<ObservationRow> = sqlx::query_as(
            "SELECT o.* FROM observations o \
             JOIN imaged_moments im ON o.imaged_moment_uuid = im.uuid \
             WHERE im.video_reference_uuid = $1 \
             ORDER BY im.seq ASC, o.seq ASC",
        )
        .bind(video_reference_uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(ObservationRow::into_observation)
            .collect())
    }

    async fn delete_observation(&self, observation_uuid: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        // Associations go with it via ON DELETE CASCADE.
        let moment: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM observations WHERE uuid = $1 RETURNING imaged_moment_uuid",
        )
        .bind(observation_uuid)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(moment) = moment else {
            tx.rollback().await?;
            return Ok(false);
        };
        sqlx::query(
            "UPDATE imaged_moments SET lifecycle = 'orphaned' \
             WHERE uuid = $1 \
               AND NOT EXISTS (SELECT 1 FROM observations WHERE imaged_moment_uuid = $1)",
        )
        .bind(moment)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn insert_association(&self, association: &Association) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO associations \
                 (uuid, observation_uuid, link_name, to_concept, link_value, mime_type) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(association.association_uuid)
        .bind(association.observation_uuid)
        .bind(&association.link_name)
        .bind(&association.to_concept)
        .bind(&association.link_value)
        .bind(&association.mime_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_associations(
        &self,
        observation_uuid: Uuid,
    ) -> Result<Vec<Association>, AppError> {
        let rows: Vec<AssociationRow> = sqlx::query_as(
            "SELECT * FROM associations WHERE observation_uuid = $1 ORDER BY seq ASC",
        )
        .bind(observation_uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(AssociationRow::into_association)
            .collect())
    }

    async fn insert_image_reference(&self, image: &ImageReference) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO image_references \
                 (uuid, imaged_moment_uuid, url, width_pixels, height_pixels, format, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(image.image_reference_uuid)
        .bind(image.imaged_moment_uuid)
        .bind(&image.url)
        .bind(image.width_pixels)
        .bind(image.height_pixels)
        .bind(&image.format)
        .bind(&image.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_image_references_by_video(
        &self,
        video_reference_uuid: Uuid,
    ) -> Result<Vec<ImageReference>, AppError> {
        let rows: Vec<ImageReferenceRow> = sqlx::query_as(
            "SELECT ir.* FROM image_references ir \
             JOIN imaged_moments im ON ir.imaged_moment_uuid = im.uuid \
             WHERE im.video_reference_uuid = $1 \
             ORDER BY ir.seq ASC",
        )
        .bind(video_reference_uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ImageReferenceRow::into_image).collect())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(sqlx::FromRow)]
struct MomentRow {
    uuid: Uuid,
    video_reference_uuid: Uuid,
    recorded_timestamp: Option<DateTime<Utc>>,
    elapsed_time_millis: Option<i64>,
    timecode: Option<String>,
    lifecycle: String,
}

impl MomentRow {
    fn into_moment(self) -> Result<ImagedMoment, AppError> {
        let lifecycle = MomentLifecycle::parse(&self.lifecycle)
            .ok_or_else(|| AppError::Internal(anyhow!("Unknown lifecycle '{}'", self.lifecycle)))?;
        Ok(ImagedMoment {
            imaged_moment_uuid: self.uuid,
            video_reference_uuid: self.video_reference_uuid,
            recorded_timestamp: self.recorded_timestamp,
            elapsed_time_millis: self.elapsed_time_millis,
            timecode: self.timecode,
            lifecycle,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ObservationRow {
    uuid: Uuid,
    imaged_moment_uuid: Uuid,
    concept: String,
    observer: String,
    observation_timestamp: DateTime<Utc>,
    duration_millis: Option<i64>,
    observation_group: Option<String>,
    activity: Option<String>,
}

impl ObservationRow {
    fn into_observation(self) -> Observation {
        Observation {
            observation_uuid: self.uuid,
            imaged_moment_uuid: self.imaged_moment_uuid,
            concept: self.concept,
            observer: self.observer,
            observation_timestamp: self.observation_timestamp,
            duration_millis: self.duration_millis,
            group: self.observation_group,
            activity: self.activity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AssociationRow {
    uuid: Uuid,
    observation_uuid: Uuid,
    link_name: String,
    to_concept: String,
    link_value: Option<String>,
    mime_type: String,
}

impl AssociationRow {
    fn into_association(self) -> Association {
        Association {
            association_uuid: self.uuid,
            observation_uuid: self.observation_uuid,
            link_name: self.link_name,
            to_concept: self.to_concept,
            link_value: self.link_value,
            mime_type: self.mime_type,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ImageReferenceRow {
    uuid: Uuid,
    imaged_moment_uuid: Uuid,
    url: String,
    width_pixels: Option<i32>,
    height_pixels: Option<i32>,
    format: Option<String>,
    description: Option<String>,
}

impl ImageReferenceRow {
    fn into_image(self) -> ImageReference {
        ImageReference {
            image_reference_uuid: self.uuid,
            imaged_moment_uuid: self.imaged_moment_uuid,
            url: self.url,
            width_pixels: self.width_pixels,
            height_pixels: self.height_pixels,
            format: self.format,
            description: self.description,
        }
    }
}
