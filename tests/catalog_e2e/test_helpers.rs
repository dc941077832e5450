//! Shared helpers for the catalog E2E tests.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::{App, test, web};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;
use vod_media_lib::api::{configure_api, configure_file_routes};
use vod_media_lib::auth::{JwtSecret, Role, issue_token};
use vod_media_lib::config::Config;
use vod_media_lib::db::DbPool;
use vod_media_lib::error::AppResult;
use vod_media_lib::services::transcoder::{EncodeTarget, Encoder, Rung};
use vod_media_lib::services::{
    IntakeLimits, MediaIntake, MediaStorage, TranscodeQueue, TranscodeWorker,
};

const TEST_SECRET: &str = "catalog-e2e-signing-secret";

static MIGRATIONS_RUN: OnceLock<()> = OnceLock::new();

/// Writes a one-line playlist instead of running ffmpeg.
struct PlaylistOnlyEncoder;

#[async_trait]
impl Encoder for PlaylistOnlyEncoder {
    async fn encode(&self, _source: &Path, _rung: &Rung, target: &EncodeTarget) -> AppResult<()> {
        tokio::fs::create_dir_all(&target.dir).await?;
        tokio::fs::write(target.playlist(), "#EXTM3U\n").await?;
        Ok(())
    }
}

/// Create a fresh DB pool. Migrations run only once.
pub async fn create_test_pool() -> DbPool {
    let mut config = Config::from_env().expect(
        "Failed to load config. Ensure DATABASE_URL or individual DB vars are set, \
         and that PostgreSQL is running.",
    );
    config.database.max_connections = 2;
    config.database.min_connections = 1;

    let pool = DbPool::new(&config)
        .await
        .expect("Failed to connect to database");

    if MIGRATIONS_RUN.get().is_none() {
        pool.run_migrations()
            .await
            .expect("Failed to run migrations");
        let _ = MIGRATIONS_RUN.set(());
    }

    pool
}

/// Generate a unique name for test isolation.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub fn admin_header() -> (header::HeaderName, String) {
    let secret = JwtSecret::new(SecretString::from(TEST_SECRET.to_string()));
    let token = issue_token(1, Role::Admin, &secret).expect("Failed to issue token");
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Temporary media root with the standard layout.
pub async fn media_root() -> (TempDir, MediaStorage) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = MediaStorage::new(dir.path());
    storage
        .ensure_layout()
        .await
        .expect("Failed to create media layout");
    (dir, storage)
}

pub fn default_limits() -> IntakeLimits {
    IntakeLimits {
        max_video_size: 8 * 1024 * 1024,
        max_field_size: 1024 * 1024,
    }
}

/// Create the full API app over `storage` with the given upload caps.
pub async fn create_test_app(
    pool: &DbPool,
    storage: &MediaStorage,
    limits: IntakeLimits,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let worker = TranscodeWorker::new(
        Arc::new(pool.clone()),
        Arc::new(PlaylistOnlyEncoder),
        storage.clone(),
    );
    let queue = TranscodeQueue::start(worker, 1);
    let intake = MediaIntake::new(pool.clone(), storage.clone(), queue.clone(), limits);
    let secret = JwtSecret::new(SecretString::from(TEST_SECRET.to_string()));

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(queue))
            .app_data(web::Data::new(intake))
            .app_data(web::Data::new(secret))
            .service(web::scope("/api").configure(configure_api))
            .configure(configure_file_routes),
    )
    .await
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode `parts` as `multipart/form-data`. Returns the content type and body.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let boundary = format!("----vod-e2e-{}", Uuid::new_v4().simple());
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

/// Send a multipart request as admin. Returns status and JSON body.
pub async fn send_form<S>(app: &S, method: &str, uri: &str, parts: &[Part<'_>]) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (content_type, body) = multipart(parts);
    let req = match method {
        "PUT" => test::TestRequest::put(),
        _ => test::TestRequest::post(),
    }
    .uri(uri)
    .insert_header(admin_header())
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Send a JSON request as admin with `method`. Returns status and JSON body.
pub async fn send_json_as<S>(app: &S, method: &str, uri: &str, payload: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = match method {
        "PUT" => test::TestRequest::put(),
        _ => test::TestRequest::post(),
    }
    .uri(uri)
    .insert_header(admin_header())
    .set_json(payload)
    .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// POST a JSON body as admin. Returns status and JSON body.
pub async fn send_json<S>(app: &S, uri: &str, payload: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    send_json_as(app, "POST", uri, payload).await
}

/// GET a JSON resource. Returns status and JSON body.
pub async fn get_json<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Create a category to use as a content type. Returns its name.
pub async fn create_category<S>(app: &S) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let name = unique("Anime");
    let (status, body) = send_json(app, "/api/categories", json!({ "name": name })).await;
    assert_eq!(status, 201, "Category creation failed: {}", body);
    name
}

/// Create a genre. Returns its id.
pub async fn create_genre<S>(app: &S) -> i64
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = send_json(app, "/api/genres", json!({ "name": unique("Action") })).await;
    assert_eq!(status, 201, "Genre creation failed: {}", body);
    body["id"].as_i64().expect("genre id")
}
