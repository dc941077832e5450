//! E2E tests: bearer token extractors.

use actix_web::http::{StatusCode, header};
use actix_web::test;
use secrecy::SecretString;
use serde_json::Value;
use vod_media_lib::auth::{JwtSecret, Role, issue_token};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_missing_token_is_unauthorized() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get().uri("/admin-only").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_user_token_is_forbidden_on_admin_route() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/admin-only")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token_for(Role::User)),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_user_token_reads_own_session() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token_for(Role::User)),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], 1);
    assert_eq!(body["role"], "user");
    assert!(body["expires_at"].is_string());
}

#[actix_rt::test]
async fn test_session_without_token_is_unauthorized() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_admin_token_is_accepted() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;

    let req = test::TestRequest::get()
        .uri("/admin-only")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token_for(Role::Admin)),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&test::read_body(resp).await[..], b"admin 1");
}

#[actix_rt::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (_dir, storage) = media_root().await;
    let app = create_test_app(&storage).await;
    let foreign = JwtSecret::new(SecretString::from("not-the-server-secret".to_string()));
    let token = issue_token(1, Role::Admin, &foreign).unwrap();

    let req = test::TestRequest::get()
        .uri("/admin-only")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
