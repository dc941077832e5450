//! VOD media server entry point.
//!
//! Starts the Actix-web server together with the background transcoder.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use vod_media_lib::api::{self, ApiDoc};
use vod_media_lib::auth::JwtSecret;
use vod_media_lib::config::Config;
use vod_media_lib::db::DbPool;
use vod_media_lib::middleware::RequestLogger;
use vod_media_lib::services::transcoder::{self, FfmpegEncoder, TranscodeQueue, TranscodeWorker};
use vod_media_lib::services::{IntakeLimits, MediaIntake, MediaStorage};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open_async(static_dir.join("index.html")).await?)
}

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("In production, DB_PASSWORD (or DATABASE_URL) and JWT_SECRET must be set to non-default values");
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let worker_count = if is_development { 4 } else { num_cpus::get() };

    info!("========================================");
    info!("  VOD Media Server");
    info!("  Environment: {}", config.environment);
    info!("  Media root: {}", config.media.root.display());
    info!("  Bind address: {}", bind_address);
    info!("  HTTP workers: {}", worker_count);
    info!("  Transcode concurrency: {}", config.media.transcode_concurrency);
    info!("========================================");

    if is_development {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let storage = MediaStorage::new(config.media.root.clone());
    storage
        .ensure_layout()
        .await
        .expect("Failed to create media directories");

    let pool = DbPool::new(&config)
        .await
        .expect("Failed to initialize database");
    pool.run_migrations().await.expect("Failed to run migrations");

    let encoder = FfmpegEncoder::new(config.media.ffmpeg_path.clone());
    let worker = TranscodeWorker::new(Arc::new(pool.clone()), Arc::new(encoder), storage.clone());
    let queue = TranscodeQueue::start(worker, config.media.transcode_concurrency);
    match transcoder::resume_unfinished(&pool, &queue).await {
        Ok(count) => info!(count, "Transcode queue ready"),
        Err(e) => error!(error = %e, "Failed to resume unfinished transcode jobs"),
    }

    let limits = IntakeLimits::from(&config.media);
    let intake = MediaIntake::new(pool.clone(), storage.clone(), queue.clone(), limits);
    let jwt_secret = JwtSecret::new(config.jwt_secret.clone());
    let origins = config.cors_allowed_origins.clone();
    let static_dir = config.static_dir.clone();
    let json_limit = config.media.max_field_size;

    if let Some(ref dir) = static_dir {
        info!("Static file serving enabled from {}", dir.display());
    }

    let server = HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(12 * 3600);

        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(intake.clone()))
            .app_data(web::Data::new(jwt_secret.clone()))
            .app_data(web::JsonConfig::default().limit(json_limit))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(web::scope("/api").configure(api::configure_api))
            .configure(api::configure_file_routes);

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}
