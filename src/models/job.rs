//! Transcode job domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::transcode_job;

/// Transcode job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Persisted, waiting for a worker slot.
    Queued,
    /// A rung is being encoded (see `current_rung`).
    Running,
    /// Every rung was produced.
    Completed,
    /// A rung failed; terminal.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transcode job as the worker sees it.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub id: i32,
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub source_path: String,
    pub status: JobStatus,
    pub current_rung: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<transcode_job::Model> for TranscodeJob {
    fn from(m: transcode_job::Model) -> Self {
        Self {
            id: m.id,
            content_id: m.content_id,
            episode_id: m.episode_id,
            source_path: m.source_path,
            // the column has a CHECK constraint, anything else is a bug upstream
            status: JobStatus::parse(&m.status).unwrap_or(JobStatus::Failed),
            current_rung: m.current_rung,
            error_message: m.error_message,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Job status as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct TranscodeJobResponse {
    pub id: i32,
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub source_path: String,
    pub status: JobStatus,
    pub current_rung: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TranscodeJob> for TranscodeJobResponse {
    fn from(job: TranscodeJob) -> Self {
        Self {
            id: job.id,
            content_id: job.content_id,
            episode_id: job.episode_id,
            source_path: job.source_path,
            status: job.status,
            current_rung: job.current_rung,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Response for media uploads.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Stored path, relative to the media root.
    pub path: String,
    /// Transcode job created for video uploads.
    #[serde(rename = "jobId", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i32>,
}
