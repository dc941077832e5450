//! Database queries for stream and download links.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entity::{download_link, stream_link};
use crate::error::{AppError, AppResult};
use crate::models::LinkKind;

/// Represents a stream link to be inserted.
#[derive(Debug, Clone)]
pub struct NewStreamLink {
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub name: String,
    pub quality: String,
    pub kind: LinkKind,
    pub provider: Option<String>,
    pub server: String,
    pub url: String,
}

/// Represents a download link to be inserted.
#[derive(Debug, Clone)]
pub struct NewDownloadLink {
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub name: String,
    pub quality: String,
    pub server: String,
    pub url: String,
}

pub async fn insert_stream_link<C: ConnectionTrait>(
    db: &C,
    link: NewStreamLink,
) -> AppResult<stream_link::Model> {
    let now = Utc::now();
    stream_link::ActiveModel {
        content_id: Set(link.content_id),
        episode_id: Set(link.episode_id),
        season_number: Set(link.season_number),
        episode_number: Set(link.episode_number),
        name: Set(link.name),
        quality: Set(link.quality),
        kind: Set(link.kind.as_str().to_string()),
        provider: Set(link.provider),
        server: Set(link.server),
        url: Set(link.url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::Database(format!("Failed to insert stream link: {}", e)))
}

pub async fn insert_download_link<C: ConnectionTrait>(
    db: &C,
    link: NewDownloadLink,
) -> AppResult<download_link::Model> {
    let now = Utc::now();
    download_link::ActiveModel {
        content_id: Set(link.content_id),
        episode_id: Set(link.episode_id),
        season_number: Set(link.season_number),
        episode_number: Set(link.episode_number),
        name: Set(link.name),
        quality: Set(link.quality),
        server: Set(link.server),
        url: Set(link.url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::Database(format!("Failed to insert download link: {}", e)))
}

/// Remove every link of a content.
pub async fn delete_content_links<C: ConnectionTrait>(db: &C, content_id: i32) -> AppResult<()> {
    stream_link::Entity::delete_many()
        .filter(stream_link::Column::ContentId.eq(content_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete stream links: {}", e)))?;
    download_link::Entity::delete_many()
        .filter(download_link::Column::ContentId.eq(content_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete download links: {}", e)))?;
    Ok(())
}

/// Move an episode's links onto its current coordinates.
///
/// When the episode's original moved, the `local` stream link pointing at the
/// old path follows it.
pub async fn sync_episode_links<C: ConnectionTrait>(
    db: &C,
    episode_id: i32,
    season_number: i32,
    episode_number: i32,
    moved_video: Option<(&str, &str)>,
) -> AppResult<()> {
    let now = Utc::now();
    stream_link::Entity::update_many()
        .col_expr(stream_link::Column::SeasonNumber, Expr::value(season_number))
        .col_expr(stream_link::Column::EpisodeNumber, Expr::value(episode_number))
        .col_expr(stream_link::Column::UpdatedAt, Expr::value(now))
        .filter(stream_link::Column::EpisodeId.eq(episode_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update stream links: {}", e)))?;
    download_link::Entity::update_many()
        .col_expr(download_link::Column::SeasonNumber, Expr::value(season_number))
        .col_expr(download_link::Column::EpisodeNumber, Expr::value(episode_number))
        .col_expr(download_link::Column::UpdatedAt, Expr::value(now))
        .filter(download_link::Column::EpisodeId.eq(episode_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update download links: {}", e)))?;

    if let Some((old_path, new_path)) = moved_video {
        stream_link::Entity::update_many()
            .col_expr(stream_link::Column::Url, Expr::value(new_path))
            .filter(stream_link::Column::EpisodeId.eq(episode_id))
            .filter(stream_link::Column::Server.eq("local"))
            .filter(stream_link::Column::Url.eq(old_path))
            .exec(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update local stream link: {}", e)))?;
    }
    Ok(())
}

/// Remove every link attached to one episode.
pub async fn delete_episode_links<C: ConnectionTrait>(db: &C, episode_id: i32) -> AppResult<()> {
    stream_link::Entity::delete_many()
        .filter(stream_link::Column::EpisodeId.eq(episode_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete stream links: {}", e)))?;
    download_link::Entity::delete_many()
        .filter(download_link::Column::EpisodeId.eq(episode_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete download links: {}", e)))?;
    Ok(())
}
