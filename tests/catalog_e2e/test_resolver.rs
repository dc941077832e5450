//! E2E tests: quality resolution with fallback to the original.

use actix_web::http::{StatusCode, header};
use actix_web::test;
use serde_json::json;
use vod_media_lib::services::storage::rendition_path;

use super::test_helpers::*;

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_missing_rendition_falls_back_then_redirects() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;

    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[Part::Text("title", &unique("Fallback")), Part::Text("type", &category)],
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    let content_id = body["content"]["id"].as_i64().unwrap();

    let original = format!("videos/original/{}_1700000000.mp4", content_id);
    std::fs::write(storage.absolute(&original), vec![9u8; 4096]).unwrap();
    let (status, episode) = send_json(
        &app,
        &format!("/api/contents/{}/episodes", content_id),
        json!({ "title": "Pilot", "episode_number": 1, "video_path": original }),
    )
    .await;
    assert_eq!(status, 201, "{}", episode);
    let episode_id = episode["id"].as_i64().unwrap();
    let uri = format!(
        "/api/media/stream/{}/episodes/{}?quality=720p",
        content_id, episode_id
    );

    // No 720p rendition yet: the original is served
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await.len(), 4096);

    let playlist = rendition_path("720p", &original).playlist;
    std::fs::write(storage.absolute(&playlist), "#EXTM3U\n").unwrap();

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert_eq!(
        location,
        format!(
            "/api/media/stream/{}/episodes/{}/hls/720p/{}_1700000000.m3u8",
            content_id, episode_id, content_id
        )
    );

    let resp = test::call_service(&app, test::TestRequest::get().uri(location).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_episode_of_other_content_is_not_found() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, body) = send_form(
            &app,
            "POST",
            "/api/contents/create",
            &[Part::Text("title", &unique("Owner")), Part::Text("type", &category)],
        )
        .await;
        ids.push(body["content"]["id"].as_i64().unwrap());
    }
    let (status, episode) = send_json(
        &app,
        &format!("/api/contents/{}/episodes", ids[0]),
        json!({ "title": "Mine", "episode_number": 1 }),
    )
    .await;
    assert_eq!(status, 201, "{}", episode);

    let uri = format!(
        "/api/media/stream/{}/episodes/{}",
        ids[1],
        episode["id"].as_i64().unwrap()
    );
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_unknown_quality_is_bad_request() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/media/stream/1?quality=4k")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
