//! E2E tests: byte-range and conditional streaming.

use actix_web::http::{StatusCode, header};
use actix_web::test;
use futures_util::future::join_all;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_full_file_advertises_ranges() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get().uri("/clip").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "video/mp4");
    assert!(resp.headers().get(header::ETAG).is_some());
    let body = test::read_body(resp).await;
    assert_eq!(body.len(), CLIP_SIZE);
}

#[actix_rt::test]
async fn test_leading_range_returns_partial_content() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=0-1023"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        resp.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes 0-1023/10000"
    );
    let body = test::read_body(resp).await;
    assert_eq!(body.len(), 1024);
    assert_eq!(&body[..], &clip_bytes()[..1024]);
}

#[actix_rt::test]
async fn test_suffix_range_returns_tail() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=-100"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        resp.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes 9900-9999/10000"
    );
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], &clip_bytes()[9900..]);
}

#[actix_rt::test]
async fn test_open_range_runs_to_end() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=9000-"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        resp.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes 9000-9999/10000"
    );
    assert_eq!(test::read_body(resp).await.len(), 1000);
}

#[actix_rt::test]
async fn test_range_past_end_is_not_satisfiable() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=99999999-"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        resp.headers().get(header::CONTENT_RANGE).unwrap(),
        "bytes */10000"
    );
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_rt::test]
async fn test_matching_etag_is_not_modified() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/clip").to_request()).await;
    let etag = first
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::IF_NONE_MATCH, etag.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_rt::test]
async fn test_stale_if_range_serves_full_file() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=0-9"))
        .insert_header((header::IF_RANGE, "\"some-other-version\""))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await.len(), CLIP_SIZE);
}

#[actix_rt::test]
async fn test_weak_if_range_serves_full_file() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get().uri("/clip").to_request();
    let resp = test::call_service(&app, req).await;
    let etag = resp
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(etag.starts_with("W/"));

    let req = test::TestRequest::get()
        .uri("/clip")
        .insert_header((header::RANGE, "bytes=0-9"))
        .insert_header((header::IF_RANGE, etag))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(test::read_body(resp).await.len(), CLIP_SIZE);
}

#[actix_rt::test]
async fn test_concurrent_overlapping_ranges_agree() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;
    let clip = clip_bytes();

    let ranges = [
        ("bytes=0-4999", 0, 4999),
        ("bytes=2500-7499", 2500, 7499),
        ("bytes=5000-9999", 5000, 9999),
        ("bytes=-100", CLIP_SIZE - 100, CLIP_SIZE - 1),
        ("bytes=100-199", 100, 199),
        ("bytes=4990-5010", 4990, 5010),
        ("bytes=9000-", 9000, CLIP_SIZE - 1),
        ("bytes=0-0", 0, 0),
    ];

    let results = join_all(ranges.iter().map(|(range, _, _)| {
        let req = test::TestRequest::get()
            .uri("/clip")
            .insert_header((header::RANGE, *range))
            .to_request();
        let app = &app;
        async move {
            let resp = test::call_service(app, req).await;
            let status = resp.status();
            let content_range = resp
                .headers()
                .get(header::CONTENT_RANGE)
                .map(|v| v.to_str().unwrap().to_string());
            let body = test::read_body(resp).await;
            (status, content_range, body)
        }
    }))
    .await;

    for ((range, start, end), (status, content_range, body)) in ranges.iter().zip(results) {
        assert_eq!(status, StatusCode::PARTIAL_CONTENT, "{range}");
        assert_eq!(
            content_range.as_deref(),
            Some(format!("bytes {start}-{end}/{CLIP_SIZE}").as_str()),
            "{range}"
        );
        assert_eq!(&body[..], &clip[*start..=*end], "{range}");
    }
}
