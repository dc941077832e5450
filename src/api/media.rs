//! Media endpoints: uploads, range streaming, HLS renditions and job status.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::IntoParams;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{TranscodeJobResponse, UploadResponse};
use crate::services::intake::{self, FormParts, MediaIntake, StagedFile};
use crate::services::resolver::{self, is_rendition_file};
use crate::services::storage::{self, MediaStorage, TRANSCODED_DIR};
use crate::services::streamer;
use crate::services::transcoder::Quality;

const VIDEO_FIELD: &str = "video";
const COVER_FIELD: &str = "cover";
const THUMBNAIL_FIELD: &str = "thumbnail";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// `original` (default) or a ladder label such as `720p`.
    pub quality: Option<String>,
}

impl StreamQuery {
    fn quality(&self) -> AppResult<Quality> {
        let raw = self.quality.as_deref().unwrap_or("original");
        Quality::parse(raw)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown quality '{}'", raw)))
    }
}

#[derive(Debug, Deserialize)]
pub struct HlsPath {
    pub content_id: i32,
    pub quality: String,
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeHlsPath {
    pub content_id: i32,
    pub episode_id: i32,
    pub quality: String,
    pub file: String,
}

/// Read the multipart body and take the file sent in `field`.
async fn read_single_file(
    intake: &MediaIntake,
    payload: &mut Multipart,
    field: &str,
    image: bool,
) -> AppResult<(FormParts, StagedFile)> {
    let image_fields: &[&str] = if image { &[COVER_FIELD, THUMBNAIL_FIELD] } else { &[] };
    let mut parts = intake::read_form(payload, intake.storage(), intake.limits(), image_fields).await?;
    match parts.take_file(field) {
        Some(file) => Ok((parts, file)),
        None => {
            parts.cleanup().await;
            Err(AppError::InvalidInput(format!(
                "Missing file field '{}'",
                field
            )))
        }
    }
}

/// Reject bodies whose declared length already exceeds what intake accepts.
fn check_declared_length(req: &HttpRequest, intake: &MediaIntake) -> AppResult<()> {
    let limits = intake.limits();
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > limits.max_video_size + limits.max_field_size => {
            Err(AppError::InvalidInput(format!(
                "Upload exceeds the maximum size of {} MiB",
                limits.max_video_size / (1024 * 1024)
            )))
        }
        _ => Ok(()),
    }
}

async fn receive_video(
    req: &HttpRequest,
    intake: &MediaIntake,
    mut payload: Multipart,
    content_id: i32,
    episode_id: Option<i32>,
) -> AppResult<HttpResponse> {
    check_declared_length(req, intake)?;
    let (parts, file) = read_single_file(intake, &mut payload, VIDEO_FIELD, false).await?;
    let result = intake.upload_video(content_id, episode_id, file).await;
    parts.cleanup().await;
    let (path, job) = result?;

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "Video uploaded successfully".to_string(),
        path,
        job_id: Some(job.id),
    }))
}

/// Upload a content-level video. Transcoding runs in the background.
#[utoipa::path(
    post,
    path = "/api/media/content/{content_id}/video",
    tag = "Media",
    params(("content_id" = i32, Path, description = "Content id")),
    request_body(content_type = "multipart/form-data", description = "Field `video`"),
    responses(
        (status = 201, description = "Video stored and queued", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unknown target", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_content_video(
    _admin: AdminUser,
    req: HttpRequest,
    intake: web::Data<MediaIntake>,
    path: web::Path<i32>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    receive_video(&req, &intake, payload, path.into_inner(), None).await
}

/// Upload an episode video. Transcoding runs in the background.
#[utoipa::path(
    post,
    path = "/api/media/content/{content_id}/episodes/{episode_id}/video",
    tag = "Media",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id")
    ),
    request_body(content_type = "multipart/form-data", description = "Field `video`"),
    responses(
        (status = 201, description = "Video stored and queued", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unknown target", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_episode_video(
    _admin: AdminUser,
    req: HttpRequest,
    intake: web::Data<MediaIntake>,
    path: web::Path<(i32, i32)>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (content_id, episode_id) = path.into_inner();
    receive_video(&req, &intake, payload, content_id, Some(episode_id)).await
}

#[utoipa::path(
    post,
    path = "/api/media/content/{content_id}/cover",
    tag = "Media",
    params(("content_id" = i32, Path, description = "Content id")),
    request_body(content_type = "multipart/form-data", description = "Field `cover`"),
    responses(
        (status = 201, description = "Cover stored", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_cover(
    _admin: AdminUser,
    intake: web::Data<MediaIntake>,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let (parts, file) = read_single_file(&intake, &mut payload, COVER_FIELD, true).await?;
    let result = intake.upload_cover(path.into_inner(), file).await;
    parts.cleanup().await;

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "Cover uploaded successfully".to_string(),
        path: result?,
        job_id: None,
    }))
}

#[utoipa::path(
    post,
    path = "/api/media/episode/{episode_id}/thumbnail",
    tag = "Media",
    params(("episode_id" = i32, Path, description = "Episode id")),
    request_body(content_type = "multipart/form-data", description = "Field `thumbnail`"),
    responses(
        (status = 201, description = "Thumbnail stored", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_thumbnail(
    _admin: AdminUser,
    intake: web::Data<MediaIntake>,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let (parts, file) = read_single_file(&intake, &mut payload, THUMBNAIL_FIELD, true).await?;
    let result = intake.upload_episode_thumb(path.into_inner(), file).await;
    parts.cleanup().await;

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "Thumbnail uploaded successfully".to_string(),
        path: result?,
        job_id: None,
    }))
}

async fn stream(
    req: &HttpRequest,
    pool: &DbPool,
    storage: &MediaStorage,
    content_id: i32,
    episode_id: Option<i32>,
    query: &StreamQuery,
) -> AppResult<HttpResponse> {
    let quality = query.quality()?;
    let resolved = resolver::resolve(pool, storage, content_id, episode_id, quality).await?;

    if let Some(rung) = resolved.rendition {
        let location = format!(
            "{}/hls/{}/{}.m3u8",
            req.path().trim_end_matches('/'),
            rung.label,
            storage::file_stem(&resolved.original)
        );
        debug!(content_id, ?episode_id, quality = rung.label, location = %location, "Redirecting to rendition");
        return Ok(HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, location))
            .finish());
    }

    streamer::serve_file(req, &resolved.path).await
}

/// Stream a content's video with range support.
#[utoipa::path(
    get,
    path = "/api/media/stream/{content_id}",
    tag = "Media",
    params(("content_id" = i32, Path, description = "Content id"), StreamQuery),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 304, description = "Not modified"),
        (status = 307, description = "Redirect to the HLS playlist of the requested quality"),
        (status = 400, description = "Unknown quality", body = crate::error::ErrorResponse),
        (status = 404, description = "Content or file not found", body = crate::error::ErrorResponse),
        (status = 416, description = "Range not satisfiable"),
    )
)]
pub async fn stream_content(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    storage: web::Data<MediaStorage>,
    path: web::Path<i32>,
    query: web::Query<StreamQuery>,
) -> AppResult<HttpResponse> {
    stream(&req, &pool, &storage, path.into_inner(), None, &query).await
}

/// Stream an episode's video with range support.
#[utoipa::path(
    get,
    path = "/api/media/stream/{content_id}/episodes/{episode_id}",
    tag = "Media",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id"),
        StreamQuery
    ),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 304, description = "Not modified"),
        (status = 307, description = "Redirect to the HLS playlist of the requested quality"),
        (status = 400, description = "Unknown quality", body = crate::error::ErrorResponse),
        (status = 404, description = "Episode or file not found", body = crate::error::ErrorResponse),
        (status = 416, description = "Range not satisfiable"),
    )
)]
pub async fn stream_episode(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    storage: web::Data<MediaStorage>,
    path: web::Path<(i32, i32)>,
    query: web::Query<StreamQuery>,
) -> AppResult<HttpResponse> {
    let (content_id, episode_id) = path.into_inner();
    stream(&req, &pool, &storage, content_id, Some(episode_id), &query).await
}

async fn rendition_file(
    req: &HttpRequest,
    pool: &DbPool,
    storage: &MediaStorage,
    content_id: i32,
    episode_id: Option<i32>,
    quality: &str,
    file: &str,
) -> AppResult<HttpResponse> {
    let Some(Quality::Rendition(rung)) = Quality::parse(quality) else {
        return Err(AppError::NotFound(format!("Rendition {}", quality)));
    };
    let resolved = resolver::resolve(pool, storage, content_id, episode_id, Quality::Original).await?;
    if !is_rendition_file(&resolved.original, file) {
        return Err(AppError::NotFound(format!("Rendition file {}", file)));
    }

    let relative = format!("{}/{}/{}", TRANSCODED_DIR, rung.label, file);
    streamer::serve_file(req, &storage.absolute(&relative)).await
}

/// Playlist or segment of a content's rendition.
#[utoipa::path(
    get,
    path = "/api/media/stream/{content_id}/hls/{quality}/{file}",
    tag = "Media",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("quality" = String, Path, description = "Ladder label"),
        ("file" = String, Path, description = "Playlist or segment file name")
    ),
    responses(
        (status = 200, description = "Playlist or segment"),
        (status = 404, description = "Not produced yet", body = crate::error::ErrorResponse),
    )
)]
pub async fn content_hls(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    storage: web::Data<MediaStorage>,
    path: web::Path<HlsPath>,
) -> AppResult<HttpResponse> {
    let p = path.into_inner();
    rendition_file(&req, &pool, &storage, p.content_id, None, &p.quality, &p.file).await
}

/// Playlist or segment of an episode's rendition.
#[utoipa::path(
    get,
    path = "/api/media/stream/{content_id}/episodes/{episode_id}/hls/{quality}/{file}",
    tag = "Media",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id"),
        ("quality" = String, Path, description = "Ladder label"),
        ("file" = String, Path, description = "Playlist or segment file name")
    ),
    responses(
        (status = 200, description = "Playlist or segment"),
        (status = 404, description = "Not produced yet", body = crate::error::ErrorResponse),
    )
)]
pub async fn episode_hls(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    storage: web::Data<MediaStorage>,
    path: web::Path<EpisodeHlsPath>,
) -> AppResult<HttpResponse> {
    let p = path.into_inner();
    rendition_file(
        &req,
        &pool,
        &storage,
        p.content_id,
        Some(p.episode_id),
        &p.quality,
        &p.file,
    )
    .await
}

/// Status of a transcoding job.
#[utoipa::path(
    get,
    path = "/api/media/jobs/{job_id}",
    tag = "Media",
    params(("job_id" = i32, Path, description = "Transcode job id")),
    responses(
        (status = 200, description = "Job status", body = TranscodeJobResponse),
        (status = 404, description = "Job not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_job(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let job_id = path.into_inner();
    let job = pool
        .get_transcode_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transcode job {}", job_id)))?;
    info!(job_id, user_id = admin.claims.user_id, status = %job.status, "Job status requested");
    Ok(HttpResponse::Ok().json(TranscodeJobResponse::from(job)))
}

/// Configure media routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/media/content/{content_id}/video").route(web::post().to(upload_content_video)),
    )
    .service(
        web::resource("/media/content/{content_id}/episodes/{episode_id}/video")
            .route(web::post().to(upload_episode_video)),
    )
    .service(web::resource("/media/content/{content_id}/cover").route(web::post().to(upload_cover)))
    .service(
        web::resource("/media/episode/{episode_id}/thumbnail").route(web::post().to(upload_thumbnail)),
    )
    .service(web::resource("/media/stream/{content_id}").route(web::get().to(stream_content)))
    .service(
        web::resource("/media/stream/{content_id}/episodes/{episode_id}")
            .route(web::get().to(stream_episode)),
    )
    .service(
        web::resource("/media/stream/{content_id}/hls/{quality}/{file}")
            .route(web::get().to(content_hls)),
    )
    .service(
        web::resource("/media/stream/{content_id}/episodes/{episode_id}/hls/{quality}/{file}")
            .route(web::get().to(episode_hls)),
    )
    .service(web::resource("/media/jobs/{job_id}").route(web::get().to(get_job)));
}
