//! E2E tests: editing an episode keeps its links attached to it.

use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_renumbered_episode_moves_its_links() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;

    let episodes = json!([{
        "title": "Pilot",
        "episodeNumber": 1,
        "streamLinks": [
            { "name": "Server 1", "type": "embed", "quality": "720p",
              "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }
        ],
        "downloadLinks": [
            { "name": "Mirror", "quality": "1080p", "url": "https://files.example.org/pilot.mp4" }
        ]
    }])
    .to_string();
    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("Renumber")),
            Part::Text("type", &category),
            Part::Text("episodes", &episodes),
        ],
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", body);
    let content_id = body["content"]["id"].as_i64().unwrap();
    let episode_id = body["content"]["episodes"][0]["id"].as_i64().unwrap();

    let (status, body) = send_json_as(
        &app,
        "PUT",
        &format!("/api/contents/{}/episodes/{}", content_id, episode_id),
        json!({ "title": "Pilot", "episode_number": 5, "season_number": 2 }),
    )
    .await;
    assert_eq!(status, 200, "update failed: {}", body);

    let (status, content) = get_json(&app, &format!("/api/contents/{}", content_id)).await;
    assert_eq!(status, 200);
    assert_eq!(content["episodes"][0]["episode_number"], 5);
    for link in [&content["stream_links"][0], &content["download_links"][0]] {
        assert_eq!(link["episode_id"].as_i64(), Some(episode_id));
        assert_eq!(link["season_number"], 2);
        assert_eq!(link["episode_number"], 5);
    }
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_new_video_path_repoints_local_stream_link() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;

    let episodes = json!([{
        "title": "Feature",
        "episodeNumber": 1,
        "streamLinks": [
            { "name": "Local", "type": "self-hosted", "quality": "1080p", "videoField": "ep1" },
            { "name": "Server 1", "type": "embed", "quality": "720p",
              "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }
        ]
    }])
    .to_string();
    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("Repoint")),
            Part::Text("type", &category),
            Part::Text("episodes", &episodes),
            Part::File("ep1", "feature.mp4", b"not really a video"),
        ],
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", body);
    let content_id = body["content"]["id"].as_i64().unwrap();
    let episode_id = body["content"]["episodes"][0]["id"].as_i64().unwrap();

    let replacement = format!("videos/original/{}_1800000000.mp4", content_id);
    let (status, body) = send_json_as(
        &app,
        "PUT",
        &format!("/api/contents/{}/episodes/{}", content_id, episode_id),
        json!({ "title": "Feature", "episode_number": 1, "video_path": replacement }),
    )
    .await;
    assert_eq!(status, 200, "update failed: {}", body);

    let (_, content) = get_json(&app, &format!("/api/contents/{}", content_id)).await;
    let links = content["stream_links"].as_array().unwrap();
    let local = links.iter().find(|l| l["server"] == "local").unwrap();
    let external = links.iter().find(|l| l["server"] == "external").unwrap();
    assert_eq!(local["url"], replacement.as_str());
    assert_eq!(
        external["url"],
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
}
