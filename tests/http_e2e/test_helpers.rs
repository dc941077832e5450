//! Shared helpers for the HTTP E2E tests.

use std::path::PathBuf;

use actix_web::dev::ServiceResponse;
use actix_web::{App, HttpRequest, HttpResponse, test, web};
use secrecy::SecretString;
use tempfile::TempDir;
use vod_media_lib::api::{configure_file_routes, configure_session_routes};
use vod_media_lib::auth::{AdminUser, JwtSecret, Role, issue_token};
use vod_media_lib::error::AppResult;
use vod_media_lib::services::MediaStorage;
use vod_media_lib::services::streamer::serve_file;

/// Secret shared by the test app and the tokens it is handed.
pub const TEST_SECRET: &str = "http-e2e-signing-secret";

/// Size of the clip written by [`media_root`].
pub const CLIP_SIZE: usize = 10_000;

/// Relative path of the clip under the media root.
pub const CLIP_PATH: &str = "videos/original/7_1700000000.mp4";

/// Deterministic clip bytes: byte `i` is `i % 251`.
pub fn clip_bytes() -> Vec<u8> {
    (0..CLIP_SIZE).map(|i| (i % 251) as u8).collect()
}

/// A media root with the standard layout and one clip.
pub async fn media_root() -> (TempDir, MediaStorage) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = MediaStorage::new(dir.path());
    storage
        .ensure_layout()
        .await
        .expect("Failed to create media layout");
    std::fs::write(storage.absolute(CLIP_PATH), clip_bytes()).expect("Failed to write clip");
    (dir, storage)
}

pub fn jwt_secret() -> JwtSecret {
    JwtSecret::new(SecretString::from(TEST_SECRET.to_string()))
}

pub fn token_for(role: Role) -> String {
    issue_token(1, role, &jwt_secret()).expect("Failed to issue token")
}

async fn clip(req: HttpRequest, file: web::Data<PathBuf>) -> AppResult<HttpResponse> {
    serve_file(&req, file.get_ref()).await
}

async fn admin_only(admin: AdminUser) -> HttpResponse {
    HttpResponse::Ok().body(format!("admin {}", admin.claims.user_id))
}

/// App with `/clip` streaming the test clip, `/media/...` file routes, an
/// admin-only route and `/api/auth/me`.
pub async fn create_test_app(
    storage: &MediaStorage,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let clip_path = storage.absolute(CLIP_PATH);
    test::init_service(
        App::new()
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(clip_path))
            .app_data(web::Data::new(jwt_secret()))
            .route("/clip", web::get().to(clip))
            .route("/admin-only", web::get().to(admin_only))
            .service(web::scope("/api").configure(configure_session_routes))
            .configure(configure_file_routes),
    )
    .await
}
