//! E2E tests: static files under `/media`.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_stored_cover_is_served() {
    let (_dir, storage) = media_root().await;
    std::fs::write(storage.absolute("thumbnails/content/7_cover.jpg"), b"jpeg").unwrap();
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/media/thumbnails/content/7_cover.jpg")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&test::read_body(resp).await[..], b"jpeg");
}

#[actix_rt::test]
async fn test_missing_file_is_json_not_found() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/media/thumbnails/content/404_cover.jpg")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_staging_area_is_hidden() {
    let (_dir, storage) = media_root().await;
    let staged = storage.absolute(".incoming/abc/part_0");
    std::fs::create_dir_all(staged.parent().unwrap()).unwrap();
    std::fs::write(&staged, b"partial upload").unwrap();
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/media/.incoming/abc/part_0")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
