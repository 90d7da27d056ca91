//! End-to-end flows through the service layer, following the call sequences a
//! typical annotation client issues over HTTP.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use benthic_api::annotation::requests::{CreateAnnotationForm, UpdateAnnotationForm};
use benthic_api::annotation::service::{
    create_annotation, get_annotation, list_annotations_by_video, update_annotation,
};
use benthic_api::association::service::{create_association, CreateAssociationForm};
use benthic_api::clock::{Clock, ManualClock};
use benthic_api::errors::AppError;
use benthic_api::image::service::{create_image_reference, CreateImageForm};
use benthic_api::models::moment::MomentLifecycle;
use benthic_api::store::{AnnotationStore, MemoryStore};

fn clock() -> ManualClock {
    ManualClock::new(
        "2016-07-28T14:00:00Z"
            .parse::<DateTime<Utc>>()
            .unwrap(),
    )
}

fn create_form(video: Uuid, concept: &str, observer: &str) -> CreateAnnotationForm {
    CreateAnnotationForm {
        video_reference_uuid: video,
        concept: concept.to_string(),
        observer: observer.to_string(),
        observation_timestamp: None,
        recorded_timestamp: None,
        timecode: None,
        elapsed_time_millis: None,
        duration_millis: None,
        group: None,
        activity: None,
    }
}

fn empty_update() -> UpdateAnnotationForm {
    UpdateAnnotationForm {
        observation_uuid: None,
        video_reference_uuid: None,
        concept: None,
        observer: None,
        observation_timestamp: None,
        recorded_timestamp: None,
        timecode: None,
        elapsed_time_millis: None,
        duration_millis: None,
        group: None,
        activity: None,
    }
}

#[tokio::test]
async fn full_annotation_lifecycle() {
    let store = MemoryStore::new();
    let clock = clock();
    let video = Uuid::new_v4();

    // Create with the minimum fields
    let mut form = create_form(video, "Nanomia bijuga", "brian");
    form.recorded_timestamp = Some("2016-07-28T14:29:01.030Z".to_string());
    let first = create_annotation(&store, &clock, form.validate().unwrap())
        .await
        .unwrap();
    assert_eq!(first.concept, "Nanomia bijuga");
    assert_eq!(first.video_reference_uuid, video);

    // Create with every field
    let mut form = create_form(video, "Aegina citrea", "schlin");
    form.observation_timestamp = Some("2016-07-28T15:01:02Z".to_string());
    form.timecode = Some("01:23:34:09".to_string());
    form.elapsed_time_millis = Some(112_345);
    form.duration_millis = Some(1200);
    form.group = Some("ROV".to_string());
    form.activity = Some("transect".to_string());
    form.recorded_timestamp = Some("2016-07-28T14:39:02.123Z".to_string());
    let second = create_annotation(&store, &clock, form.validate().unwrap())
        .await
        .unwrap();
    assert_eq!(second.group.as_deref(), Some("ROV"));
    assert_eq!(second.elapsed_time_millis, Some(112_345));
    assert_ne!(second.imaged_moment_uuid, first.imaged_moment_uuid);

    // Update just the concept
    clock.advance(Duration::minutes(5));
    let mut update = empty_update();
    update.concept = Some("Atolla".to_string());
    let updated = update_annotation(
        &store,
        &clock,
        second.observation_uuid,
        update.validate().unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(updated.concept, "Atolla");
    assert_eq!(updated.observation_timestamp, clock.now());
    // Observer kept from the create
    assert_eq!(updated.observer, "schlin");

    // Associations, minimal and full
    create_association(
        &store,
        CreateAssociationForm {
            observation_uuid: second.observation_uuid,
            link_name: "swimming".to_string(),
            to_concept: None,
            link_value: None,
            mime_type: None,
        },
    )
    .await
    .unwrap();
    create_association(
        &store,
        CreateAssociationForm {
            observation_uuid: second.observation_uuid,
            link_name: "distance measurement".to_string(),
            to_concept: Some("self".to_string()),
            link_value: Some(r#"{"x0": 100, "y0: 89", "x1"#.to_string()),
            mime_type: None,
        },
    )
    .await
    .unwrap();

    // Point lookup carries the associations in creation order
    let fetched = get_annotation(&store, second.observation_uuid)
        .await
        .unwrap();
    assert_eq!(fetched.associations.len(), 2);
    assert_eq!(fetched.associations[0].link_name, "swimming");
    assert_eq!(
        fetched.associations[1].link_name,
        "distance measurement"
    );

    // Fan-out query sees both annotations
    let listed = list_annotations_by_video(&store, video).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].observation_uuid, first.observation_uuid);
    assert_eq!(listed[1].observation_uuid, second.observation_uuid);
}

#[tokio::test]
async fn full_update_moves_the_annotation_to_another_video() {
    let store = MemoryStore::new();
    let clock = clock();
    let old_video = Uuid::new_v4();
    let new_video = Uuid::new_v4();

    let mut form = create_form(old_video, "Aegina citrea", "schlin");
    form.elapsed_time_millis = Some(112_345);
    let created = create_annotation(&store, &clock, form.validate().unwrap())
        .await
        .unwrap();

    clock.advance(Duration::minutes(1));
    let mut update = empty_update();
    update.video_reference_uuid = Some(new_video);
    update.concept = Some("Pandalus platyceros".to_string());
    update.observer = Some("danelle".to_string());
    update.timecode = Some("08:00:34:09".to_string());
    update.elapsed_time_millis = Some(3_045_999);
    update.duration_millis = Some(8);
    update.group = Some("AUV".to_string());
    update.activity = Some("descent".to_string());
    update.recorded_timestamp = Some("2021-07-28T14:39:02.123Z".to_string());

    let moved = update_annotation(
        &store,
        &clock,
        created.observation_uuid,
        update.validate().unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(moved.video_reference_uuid, new_video);
    assert_eq!(moved.concept, "Pandalus platyceros");
    assert_eq!(moved.observer, "danelle");
    assert_eq!(moved.timecode.as_deref(), Some("08:00:34:09"));

    assert!(list_annotations_by_video(&store, old_video)
        .await
        .unwrap()
        .is_empty());
    let new_list = list_annotations_by_video(&store, new_video).await.unwrap();
    assert_eq!(new_list.len(), 1);

    // Source moment survives as an orphan
    let old_moments = store.list_moments_by_video(old_video).await.unwrap();
    assert_eq!(old_moments.len(), 1);
    assert_eq!(old_moments[0].lifecycle, MomentLifecycle::Orphaned);
}

#[tokio::test]
async fn images_and_annotations_share_anchored_moments() {
    let store = MemoryStore::new();
    let clock = clock();
    let video = Uuid::new_v4();

    let mut form = create_form(video, "Nanomia bijuga", "brian");
    form.recorded_timestamp = Some("2016-07-28T14:29:01.030Z".to_string());
    let annotation = create_annotation(&store, &clock, form.validate().unwrap())
        .await
        .unwrap();

    let image = create_image_reference(
        &store,
        CreateImageForm {
            video_reference_uuid: video,
            url: "http://foobar.com/anotherimage.png".to_string(),
            recorded_timestamp: Some("2016-07-28T14:29:01.030Z".to_string()),
            timecode: None,
            elapsed_time_millis: None,
            width_pixels: Some(1920),
            height_pixels: Some(1080),
            format: Some("image/png".to_string()),
            description: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        image.image.imaged_moment_uuid,
        annotation.imaged_moment_uuid
    );
}

#[tokio::test]
async fn concurrent_duplicate_creates_share_one_moment() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(clock());
    let video = Uuid::new_v4();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let clock = Arc::clone(&clock);
        handles.push(tokio::spawn(async move {
            let mut form = create_form(video, &format!("concept-{i}"), "brian");
            form.elapsed_time_millis = Some(12_345);
            create_annotation(store.as_ref(), clock.as_ref(), form.validate().unwrap())
                .await
                .unwrap()
        }));
    }

    let mut moment_uuids = Vec::new();
    for handle in handles {
        moment_uuids.push(handle.await.unwrap().imaged_moment_uuid);
    }
    moment_uuids.sort();
    moment_uuids.dedup();
    assert_eq!(moment_uuids.len(), 1);

    let listed = list_annotations_by_video(store.as_ref(), video)
        .await
        .unwrap();
    assert_eq!(listed.len(), 8);
}

#[tokio::test]
async fn association_on_missing_observation_is_rejected() {
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
