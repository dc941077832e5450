//! E2E tests: content create/update through the admin form.

use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_same_title_updates_instead_of_duplicating() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;
    let genre_id = create_genre(&app).await.to_string();
    let title = unique("Naruto");

    let (status, first) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &title),
            Part::Text("type", &category),
            Part::Text("description", "first"),
            Part::Text("genreIds", &genre_id),
        ],
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", first);
    assert_eq!(first["message"], "Content created successfully");
    let id = first["content"]["id"].as_i64().unwrap();
    assert_eq!(first["content"]["genres"].as_array().unwrap().len(), 1);

    let (status, second) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &title),
            Part::Text("type", &category),
            Part::Text("description", "second"),
        ],
    )
    .await;
    assert_eq!(status, 200, "upsert failed: {}", second);
    assert_eq!(second["message"], "Content updated successfully");
    assert_eq!(second["content"]["id"].as_i64().unwrap(), id);
    assert_eq!(second["content"]["description"], "second");
    // genreIds not submitted, so the tags stay
    assert_eq!(second["content"]["genres"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_episode_list_replaces_previous_episodes() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;
    let title = unique("Series");

    let two_episodes = json!([
        {
            "title": "Pilot",
            "episodeNumber": 1,
            "streamLinks": [
                { "name": "Server 1", "type": "embed", "quality": "720p",
                  "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }
            ],
            "downloadLinks": [
                { "name": "Mirror", "quality": "1080p", "url": "https://files.example.org/pilot.mp4" }
            ]
        },
        { "title": "Second", "episodeNumber": 2 }
    ])
    .to_string();
    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &title),
            Part::Text("type", &category),
            Part::Text("episodes", &two_episodes),
        ],
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", body);
    let content = &body["content"];
    assert_eq!(content["episodes"].as_array().unwrap().len(), 2);

    let stream = &content["stream_links"][0];
    assert_eq!(stream["type"], "embed");
    assert_eq!(stream["server"], "external");
    assert_eq!(stream["episode_number"], 1);
    let download = &content["download_links"][0];
    assert_eq!(download["server"], "Mirror");

    let one_episode = json!([{ "title": "Only", "episodeNumber": 1 }]).to_string();
    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[Part::Text("title", &title), Part::Text("episodes", &one_episode)],
    )
    .await;
    assert_eq!(status, 200, "update failed: {}", body);
    let episodes = body["content"]["episodes"].as_array().unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0]["title"], "Only");
    assert!(body["content"]["stream_links"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_self_hosted_link_stores_original_and_queues_job() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;
    let title = unique("Movie");

    let episodes = json!([{
        "title": "Feature",
        "episodeNumber": 1,
        "streamLinks": [
            { "name": "Local", "type": "self-hosted", "quality": "1080p", "videoField": "ep1" }
        ]
    }])
    .to_string();
    let (status, body) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &title),
            Part::Text("type", &category),
            Part::Text("episodes", &episodes),
            Part::File("ep1", "feature.mp4", b"not really a video"),
        ],
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", body);

    let episode = &body["content"]["episodes"][0];
    let video_path = episode["video_path"].as_str().unwrap();
    assert!(video_path.starts_with("videos/original/"), "{}", video_path);
    assert!(storage.exists(video_path).await);
    assert_eq!(body["content"]["stream_links"][0]["server"], "local");
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_unknown_type_and_duplicate_episodes_are_rejected() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;

    let (status, _) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("Typo")),
            Part::Text("type", &unique("NoSuchCategory")),
        ],
    )
    .await;
    assert_eq!(status, 400);

    let duplicated = json!([
        { "title": "A", "episodeNumber": 1 },
        { "title": "B", "episodeNumber": 1 }
    ])
    .to_string();
    let (status, _) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[
            Part::Text("title", &unique("Dupes")),
            Part::Text("type", &category),
            Part::Text("episodes", &duplicated),
        ],
    )
    .await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_by_id_rejects_taken_title() {
    let pool = create_test_pool().await;
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&pool, &storage, default_limits()).await;
    let category = create_category(&app).await;
    let first_title = unique("First");

    let (_, first) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[Part::Text("title", &first_title), Part::Text("type", &category)],
    )
    .await;
    let (_, second) = send_form(
        &app,
        "POST",
        "/api/contents/create",
        &[Part::Text("title", &unique("Second")), Part::Text("type", &category)],
    )
    .await;
    assert!(first["content"]["id"].is_i64());
    let second_id = second["content"]["id"].as_i64().unwrap();

    let (status, _) = send_form(
        &app,
        "PUT",
        &format!("/api/contents/{}", second_id),
        &[Part::Text("title", &first_title)],
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send_form(
        &app,
        "PUT",
        "/api/contents/2147483000",
        &[Part::Text("description", "nobody home")],
    )
    .await;
    assert_eq!(status, 404);
}
