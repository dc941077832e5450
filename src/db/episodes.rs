//! Database queries for episodes.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::entity::episode::{self, ActiveModel, Entity as Episode};
use crate::error::{AppError, AppResult};

use super::DbPool;
use super::links;

/// Represents an episode to be inserted.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub content_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    pub video_path: String,
    pub duration: i32,
    pub thumbnail_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}

fn validate_coordinates(season_number: i32, episode_number: i32) -> AppResult<()> {
    if episode_number < 1 {
        return Err(AppError::InvalidInput(
            "Episode number must be at least 1".to_string(),
        ));
    }
    if season_number < 1 {
        return Err(AppError::InvalidInput(
            "Season number must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Active episode at `(season, episode)` of a content, if any.
pub async fn find_by_coordinates<C: ConnectionTrait>(
    db: &C,
    content_id: i32,
    season_number: i32,
    episode_number: i32,
) -> AppResult<Option<episode::Model>> {
    Episode::find()
        .filter(episode::Column::ContentId.eq(content_id))
        .filter(episode::Column::SeasonNumber.eq(season_number))
        .filter(episode::Column::EpisodeNumber.eq(episode_number))
        .filter(episode::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find episode: {}", e)))
}

/// Insert an episode; `(content, season, episode)` must be free.
pub async fn insert_episode<C: ConnectionTrait>(
    db: &C,
    new: NewEpisode,
) -> AppResult<episode::Model> {
    validate_coordinates(new.season_number, new.episode_number)?;
    if find_by_coordinates(db, new.content_id, new.season_number, new.episode_number)
        .await?
        .is_some()
    {
        return Err(AppError::InvalidInput(format!(
            "Episode S{}E{} already exists",
            new.season_number, new.episode_number
        )));
    }

    let now = Utc::now();
    let model = ActiveModel {
        content_id: Set(new.content_id),
        title: Set(new.title),
        description: Set(new.description),
        episode_number: Set(new.episode_number),
        season_number: Set(new.season_number),
        video_path: Set(new.video_path),
        duration: Set(new.duration.max(0)),
        thumbnail_url: Set(new.thumbnail_url),
        release_date: Set(new.release_date),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };

    model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert episode: {}", e)))
}

/// Record a stored original on an episode.
pub async fn set_video_path<C: ConnectionTrait>(
    db: &C,
    episode: episode::Model,
    path: &str,
) -> AppResult<episode::Model> {
    let mut active: ActiveModel = episode.into();
    active.video_path = Set(path.to_string());
    active.updated_at = Set(Utc::now());
    active
        .update(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update video path: {}", e)))
}

/// Soft-delete every episode of a content and remove all of the content's links.
pub async fn purge_content_episodes<C: ConnectionTrait>(db: &C, content_id: i32) -> AppResult<()> {
    links::delete_content_links(db, content_id).await?;

    let result = Episode::update_many()
        .col_expr(
            episode::Column::DeletedAt,
            sea_orm::prelude::Expr::value(Utc::now()),
        )
        .filter(episode::Column::ContentId.eq(content_id))
        .filter(episode::Column::DeletedAt.is_null())
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete episodes: {}", e)))?;

    debug!(content_id, episodes = result.rows_affected, "Purged content episodes");
    Ok(())
}

/// Active episode by id regardless of owner.
pub async fn find_active<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Option<episode::Model>> {
    Episode::find_by_id(id)
        .filter(episode::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get episode: {}", e)))
}

impl DbPool {
    /// Get an active episode by id.
    pub async fn find_episode(&self, id: i32) -> AppResult<Option<episode::Model>> {
        find_active(self.connection(), id).await
    }

    /// Get an active episode that belongs to `content_id`.
    pub async fn get_episode(
        &self,
        content_id: i32,
        episode_id: i32,
    ) -> AppResult<Option<episode::Model>> {
        Ok(find_active(self.connection(), episode_id)
            .await?
            .filter(|e| e.content_id == content_id))
    }

    /// Episodes of a content ordered by season then number.
    pub async fn list_episodes(
        &self,
        content_id: i32,
        season: Option<i32>,
    ) -> AppResult<Vec<episode::Model>> {
        let mut select = Episode::find()
            .filter(episode::Column::ContentId.eq(content_id))
            .filter(episode::Column::DeletedAt.is_null());
        if let Some(season) = season {
            select = select.filter(episode::Column::SeasonNumber.eq(season));
        }

        select
            .order_by_asc(episode::Column::SeasonNumber)
            .order_by_asc(episode::Column::EpisodeNumber)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list episodes: {}", e)))
    }

    /// The episode after `(season, number)`: later in the same season, else the
    /// first of a later season.
    pub async fn next_episode(
        &self,
        content_id: i32,
        season_number: i32,
        episode_number: i32,
    ) -> AppResult<Option<episode::Model>> {
        let same_season = Episode::find()
            .filter(episode::Column::ContentId.eq(content_id))
            .filter(episode::Column::DeletedAt.is_null())
            .filter(episode::Column::SeasonNumber.eq(season_number))
            .filter(episode::Column::EpisodeNumber.gt(episode_number))
            .order_by_asc(episode::Column::EpisodeNumber)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find next episode: {}", e)))?;

        if same_season.is_some() {
            return Ok(same_season);
        }

        Episode::find()
            .filter(episode::Column::ContentId.eq(content_id))
            .filter(episode::Column::DeletedAt.is_null())
            .filter(episode::Column::SeasonNumber.gt(season_number))
            .order_by_asc(episode::Column::SeasonNumber)
            .order_by_asc(episode::Column::EpisodeNumber)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find next episode: {}", e)))
    }

    /// Highest `(season, number)` episode of a content.
    pub async fn latest_episode(&self, content_id: i32) -> AppResult<Option<episode::Model>> {
        Episode::find()
            .filter(episode::Column::ContentId.eq(content_id))
            .filter(episode::Column::DeletedAt.is_null())
            .order_by_desc(episode::Column::SeasonNumber)
            .order_by_desc(episode::Column::EpisodeNumber)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find latest episode: {}", e)))
    }

    /// Insert a single episode outside of a content upsert.
    pub async fn create_episode(&self, new: NewEpisode) -> AppResult<episode::Model> {
        insert_episode(self.connection(), new).await
    }

    /// Overwrite an episode's fields. Moving it onto taken coordinates is rejected.
    pub async fn update_episode(
        &self,
        content_id: i32,
        episode_id: i32,
        changes: NewEpisode,
    ) -> AppResult<episode::Model> {
        validate_coordinates(changes.season_number, changes.episode_number)?;
        let existing = self
            .get_episode(content_id, episode_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;

        if let Some(other) = find_by_coordinates(
            self.connection(),
            content_id,
            changes.season_number,
            changes.episode_number,
        )
        .await?
            && other.id != episode_id
        {
            return Err(AppError::InvalidInput(format!(
                "Episode S{}E{} already exists",
                changes.season_number, changes.episode_number
            )));
        }

        let old_video_path = existing.video_path.clone();
        let mut active: ActiveModel = existing.into();
        active.title = Set(changes.title);
        active.description = Set(changes.description);
        active.episode_number = Set(changes.episode_number);
        active.season_number = Set(changes.season_number);
        active.video_path = Set(changes.video_path);
        active.duration = Set(changes.duration.max(0));
        active.thumbnail_url = Set(changes.thumbnail_url);
        active.release_date = Set(changes.release_date);
        active.updated_at = Set(Utc::now());

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update episode: {}", e)))?;

        let moved_video = (updated.video_path != old_video_path)
            .then_some((old_video_path.as_str(), updated.video_path.as_str()));
        links::sync_episode_links(
            &txn,
            episode_id,
            updated.season_number,
            updated.episode_number,
            moved_video,
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit episode update: {}", e)))?;
        Ok(updated)
    }

    /// Soft-delete an episode and hard-delete its links.
    pub async fn delete_episode(&self, content_id: i32, episode_id: i32) -> AppResult<()> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let existing = find_active(&txn, episode_id)
            .await?
            .filter(|e| e.content_id == content_id)
            .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;

        links::delete_episode_links(&txn, episode_id).await?;

        let mut active: ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete episode: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit delete: {}", e)))?;
        Ok(())
    }

    /// Store a new original path on an episode.
    pub async fn update_episode_video_path(
        &self,
        episode_id: i32,
        path: &str,
    ) -> AppResult<episode::Model> {
        let episode = find_active(self.connection(), episode_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;
        set_video_path(self.connection(), episode, path).await
    }

    /// Store a new thumbnail path on an episode.
    pub async fn update_episode_thumbnail(
        &self,
        episode_id: i32,
        path: &str,
    ) -> AppResult<episode::Model> {
        let episode = find_active(self.connection(), episode_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Episode {}", episode_id)))?;

        let mut active: ActiveModel = episode.into();
        active.thumbnail_url = Set(Some(path.to_string()));
        active.updated_at = Set(Utc::now());
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update thumbnail: {}", e)))
    }
}
