//! Database queries for the durable transcode queue.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::transcode_job::{self, ActiveModel, Entity as TranscodeJobEntity};
use crate::error::{AppError, AppResult};
use crate::models::{JobStatus, TranscodeJob};

use super::DbPool;

/// Persist a queued job for an original at `source_path`.
pub async fn insert_transcode_job<C: ConnectionTrait>(
    db: &C,
    content_id: i32,
    episode_id: Option<i32>,
    source_path: &str,
) -> AppResult<TranscodeJob> {
    let now = Utc::now();
    let model = ActiveModel {
        content_id: Set(content_id),
        episode_id: Set(episode_id),
        source_path: Set(source_path.to_string()),
        status: Set(JobStatus::Queued.as_str().to_string()),
        current_rung: Set(None),
        error_message: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert transcode job: {}", e)))?;
    Ok(inserted.into())
}

impl DbPool {
    pub async fn create_transcode_job(
        &self,
        content_id: i32,
        episode_id: Option<i32>,
        source_path: &str,
    ) -> AppResult<TranscodeJob> {
        insert_transcode_job(self.connection(), content_id, episode_id, source_path).await
    }

    pub async fn get_transcode_job(&self, id: i32) -> AppResult<Option<TranscodeJob>> {
        let found = TranscodeJobEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get transcode job: {}", e)))?;
        Ok(found.map(Into::into))
    }

    /// Record a state transition.
    pub async fn update_transcode_job(
        &self,
        id: i32,
        status: JobStatus,
        current_rung: Option<&str>,
        error_message: Option<&str>,
    ) -> AppResult<()> {
        let job = TranscodeJobEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get transcode job: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Transcode job {}", id)))?;

        let mut active: ActiveModel = job.into();
        active.status = Set(status.as_str().to_string());
        active.current_rung = Set(current_rung.map(str::to_string));
        active.error_message = Set(error_message.map(str::to_string));
        active.updated_at = Set(Utc::now());

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update transcode job: {}", e)))?;
        Ok(())
    }

    /// Jobs a previous process left queued or running, oldest first.
    pub async fn list_unfinished_transcode_jobs(&self) -> AppResult<Vec<TranscodeJob>> {
        let rows = TranscodeJobEntity::find()
            .filter(transcode_job::Column::Status.is_in([
                JobStatus::Queued.as_str(),
                JobStatus::Running.as_str(),
            ]))
            .order_by_asc(transcode_job::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to list unfinished transcode jobs: {}", e))
            })?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
