//! Episode endpoints nested under a content.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::db::episodes::NewEpisode;
use crate::entity::episode;
use crate::error::{AppError, AppResult};
use crate::models::{EpisodeListQuery, EpisodeRequest, EpisodeResponse, MessageResponse};
use crate::services::storage::{MediaDir, normalize_admin_path};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextEpisodeQuery {
    /// Season of the episode just watched.
    pub season: i32,
    /// Number of the episode just watched.
    pub episode: i32,
}

fn normalized(raw: Option<&str>, dir: MediaDir, field: &str) -> AppResult<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => normalize_admin_path(raw, dir)
            .map(Some)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid {}: {}", field, raw))),
        None => Ok(None),
    }
}

/// Build the row values for an episode request. Paths that are not submitted
/// keep the values of `existing`.
fn episode_values(
    content_id: i32,
    req: EpisodeRequest,
    existing: Option<&episode::Model>,
) -> AppResult<NewEpisode> {
    if req.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    let video_path = normalized(req.video_path.as_deref(), MediaDir::Originals, "video_path")?
        .or_else(|| existing.map(|e| e.video_path.clone()))
        .unwrap_or_default();
    let thumbnail_url = normalized(
        req.thumbnail_url.as_deref(),
        MediaDir::EpisodeThumbnails,
        "thumbnail_url",
    )?
    .or_else(|| existing.and_then(|e| e.thumbnail_url.clone()));

    Ok(NewEpisode {
        content_id,
        title: req.title.trim().to_string(),
        description: req.description,
        episode_number: req.episode_number,
        season_number: req.season_number,
        video_path,
        duration: req
            .duration
            .or_else(|| existing.map(|e| e.duration))
            .unwrap_or(0),
        thumbnail_url,
        release_date: req.release_date.or_else(|| existing.and_then(|e| e.release_date)),
    })
}

async fn require_content(pool: &DbPool, content_id: i32) -> AppResult<()> {
    if pool.content_exists(content_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Content {}", content_id)))
    }
}

/// Episodes of a content, ordered by season then number.
#[utoipa::path(
    get,
    path = "/api/contents/{content_id}/episodes",
    tag = "Episodes",
    params(("content_id" = i32, Path, description = "Content id"), EpisodeListQuery),
    responses(
        (status = 200, description = "Episodes", body = Vec<EpisodeResponse>),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_episodes(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<EpisodeListQuery>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    require_content(&pool, content_id).await?;
    let episodes = pool.list_episodes(content_id, query.season).await?;
    let body: Vec<EpisodeResponse> = episodes.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// The episode that follows `(season, episode)`.
#[utoipa::path(
    get,
    path = "/api/contents/{content_id}/episodes/next",
    tag = "Episodes",
    params(("content_id" = i32, Path, description = "Content id"), NextEpisodeQuery),
    responses(
        (status = 200, description = "Next episode", body = EpisodeResponse),
        (status = 404, description = "No next episode", body = crate::error::ErrorResponse),
    )
)]
pub async fn next_episode(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<NextEpisodeQuery>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    let episode = pool
        .next_episode(content_id, query.season, query.episode)
        .await?
        .ok_or_else(|| AppError::NotFound("Next episode".to_string()))?;
    Ok(HttpResponse::Ok().json(EpisodeResponse::from(episode)))
}

/// The highest numbered episode of the last season.
#[utoipa::path(
    get,
    path = "/api/contents/{content_id}/episodes/latest",
    tag = "Episodes",
    params(("content_id" = i32, Path, description = "Content id")),
    responses(
        (status = 200, description = "Latest episode", body = EpisodeResponse),
        (status = 404, description = "Content has no episodes", body = crate::error::ErrorResponse),
    )
)]
pub async fn latest_episode(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    let episode = pool
        .latest_episode(content_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Episodes of content {}", content_id)))?;
    Ok(HttpResponse::Ok().json(EpisodeResponse::from(episode)))
}

#[utoipa::path(
    get,
    path = "/api/contents/{content_id}/episodes/{episode_id}",
    tag = "Episodes",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id")
    ),
    responses(
        (status = 200, description = "Episode", body = EpisodeResponse),
        (status = 404, description = "Episode not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_episode(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> AppResult<HttpResponse> {
    let (content_id, episode_id) = path.into_inner();
    let episode = pool
        .get_episode(content_id, episode_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;
    Ok(HttpResponse::Ok().json(EpisodeResponse::from(episode)))
}

#[utoipa::path(
    post,
    path = "/api/contents/{content_id}/episodes",
    tag = "Episodes",
    params(("content_id" = i32, Path, description = "Content id")),
    request_body = EpisodeRequest,
    responses(
        (status = 201, description = "Episode created", body = EpisodeResponse),
        (status = 400, description = "Invalid episode", body = crate::error::ErrorResponse),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_episode(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<EpisodeRequest>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    require_content(&pool, content_id).await?;
    let new = episode_values(content_id, body.into_inner(), None)?;
    let episode = pool.create_episode(new).await?;
    info!(content_id, episode_id = episode.id, "Episode created");
    Ok(HttpResponse::Created().json(EpisodeResponse::from(episode)))
}

#[utoipa::path(
    put,
    path = "/api/contents/{content_id}/episodes/{episode_id}",
    tag = "Episodes",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id")
    ),
    request_body = EpisodeRequest,
    responses(
        (status = 200, description = "Episode updated", body = EpisodeResponse),
        (status = 400, description = "Invalid episode", body = crate::error::ErrorResponse),
        (status = 404, description = "Episode not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_episode(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    body: web::Json<EpisodeRequest>,
) -> AppResult<HttpResponse> {
    let (content_id, episode_id) = path.into_inner();
    let existing = pool
        .get_episode(content_id, episode_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;
    let changes = episode_values(content_id, body.into_inner(), Some(&existing))?;
    let episode = pool.update_episode(content_id, episode_id, changes).await?;
    Ok(HttpResponse::Ok().json(EpisodeResponse::from(episode)))
}

#[utoipa::path(
    delete,
    path = "/api/contents/{content_id}/episodes/{episode_id}",
    tag = "Episodes",
    params(
        ("content_id" = i32, Path, description = "Content id"),
        ("episode_id" = i32, Path, description = "Episode id")
    ),
    responses(
        (status = 200, description = "Episode deleted", body = MessageResponse),
        (status = 404, description = "Episode not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_episode(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> AppResult<HttpResponse> {
    let (content_id, episode_id) = path.into_inner();
    pool.delete_episode(content_id, episode_id).await?;
    info!(content_id, episode_id, "Episode deleted");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Episode deleted successfully".to_string(),
    }))
}

/// Configure episode routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/contents/{content_id}/episodes")
            .route(web::get().to(list_episodes))
            .route(web::post().to(create_episode)),
    )
    .service(web::resource("/contents/{content_id}/episodes/next").route(web::get().to(next_episode)))
    .service(
        web::resource("/contents/{content_id}/episodes/latest").route(web::get().to(latest_episode)),
    )
    .service(
        web::resource("/contents/{content_id}/episodes/{episode_id}")
            .route(web::get().to(get_episode))
            .route(web::put().to(update_episode))
            .route(web::delete().to(delete_episode)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(json: &str) -> EpisodeRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_paths_are_normalized() {
        let values = episode_values(
            4,
            request(
                r#"{"title":"Pilot","episode_number":1,
                    "video_path":"media\\videos\\original\\4_100.mp4",
                    "thumbnail_url":"../../etc/passwd"}"#,
            ),
            None,
        )
        .unwrap();
        assert_eq!(values.video_path, "videos/original/4_100.mp4");
        assert_eq!(
            values.thumbnail_url.as_deref(),
            Some("thumbnails/episodes/passwd")
        );
        assert_eq!(values.season_number, 1);
    }

    #[test]
    fn test_update_keeps_unsubmitted_paths() {
        let now = Utc::now();
        let existing = episode::Model {
            id: 9,
            content_id: 4,
            title: "Old".to_string(),
            description: None,
            episode_number: 1,
            season_number: 1,
            video_path: "videos/original/4_100.mp4".to_string(),
            duration: 24,
            thumbnail_url: Some("thumbnails/episodes/9_thumbnail.jpg".to_string()),
            release_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let values = episode_values(
            4,
            request(r#"{"title":"New","episode_number":2}"#),
            Some(&existing),
        )
        .unwrap();
        assert_eq!(values.title, "New");
        assert_eq!(values.video_path, existing.video_path);
        assert_eq!(values.thumbnail_url, existing.thumbnail_url);
        assert_eq!(values.duration, 24);
    }

    #[test]
    fn test_rejects_blank_title_and_unusable_path() {
        assert!(episode_values(4, request(r#"{"title":" ","episode_number":1}"#), None).is_err());
        assert!(
            episode_values(
                4,
                request(r#"{"title":"A","episode_number":1,"video_path":"videos/.."}"#),
                None
            )
            .is_err()
        );
    }
}
