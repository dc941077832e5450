//! E2E tests: upload caps and staging cleanup.

use vod_media_lib::services::IntakeLimits;

use super::test_helpers::*;

fn tiny_limits() -> IntakeLimits {
    IntakeLimits {
        max_video_size: 2048,
        max_field_size: 256,
    }
}

async fn staging_is_empty(storage: &vod_media_lib::services::MediaStorage) -> bool {
    let staging = storage.root().join(".incoming");
    match std::fs::read_dir(&staging) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_oversized_cover_is_rejected_and_cleaned_up() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, tiny_limits()).await;
    let category = create_category(&app).await;
    let cover = vec![0u8; 1024];

    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("BigCover")),
            Part::Text("type", &category),
            Part::File("coverImage", "cover.jpg", &cover),
        ],
    )
    .await;

    assert_eq!(status, 400, "{}", body);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert!(staging_is_empty(&storage).await);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_oversized_episode_video_is_rejected() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, tiny_limits()).await;
    let category = create_category(&app).await;
    let episodes = serde_json::json!([{
        "title": "Huge",
        "episodeNumber": 1,
        "streamLinks": [{ "name": "Local", "type": "self-hosted", "videoField": "ep1" }]
    }])
    .to_string();
    let video = vec![7u8; 4096];

    let (status, _) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("HugeVideo")),
            Part::Text("type", &category),
            Part::Text("episodes", &episodes),
            Part::File("ep1", "huge.mp4", &video),
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert!(staging_is_empty(&storage).await);
    let originals = std::fs::read_dir(storage.absolute("videos/original"))
        .unwrap()
        .count();
    assert_eq!(originals, 0);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_video_within_cap_is_accepted() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, tiny_limits()).await;
    let category = create_category(&app).await;

    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[Part::Text("title", &unique("Small")), Part::Text("type", &category)],
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    let content_id = body["content"]["id"].as_i64().unwrap();

    let (status, body) = send_form(
        &app,
        "POST",
        &format!("/api/media/content/{}/video", content_id),
        &[Part::File("video", "small.mp4", &[1u8; 1024])],
    )
    .await;
    assert_eq!(status, 201, "{}", body);
    assert!(body["jobId"].is_i64());
    assert!(storage.exists(body["path"].as_str().unwrap()).await);
}
