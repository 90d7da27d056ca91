pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::annotation::handlers as annotation;
use crate::association::handlers as association;
use crate::image::handlers as image;
use crate::moment::handlers as moment;
use crate::observation::handlers as observation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Annotation API: the high-level create/update/find surface
        .route("/v1/annotations", post(annotation::handle_create_annotation))
        .route(
            "/v1/annotations/:observation_uuid",
            get(annotation::handle_get_annotation).put(annotation::handle_update_annotation),
        )
        .route(
            "/v1/annotations/videoreference/:video_reference_uuid",
            get(annotation::handle_list_annotations_by_video),
        )
        // Association API
        .route(
            "/v1/associations",
            post(association::handle_create_association),
        )
        // Image API
        .route("/v1/images", post(image::handle_create_image))
        .route(
            "/v1/images/videoreference/:video_reference_uuid",
            get(image::handle_list_images_by_video),
        )
        // Observation API: lower-level access, and the only delete surface
        .route(
            "/v1/observations/:observation_uuid",
            get(observation::handle_get_observation).delete(observation::handle_delete_observation),
        )
        .route(
            "/v1/observations/videoreference/:video_reference_uuid",
            get(observation::handle_list_observations_by_video),
        )
        // ImagedMoment API
        .route(
            "/v1/imagedmoments/videoreference/:video_reference_uuid",
            get(moment::handle_list_moments_by_video),
        )
        .with_state(state)
}
