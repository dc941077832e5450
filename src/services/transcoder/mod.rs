//! Background HLS transcoding.
//!
//! Intake persists a job row and pushes its id onto a bounded channel. A single
//! dispatcher task pulls ids and spawns one task per job, gated by a semaphore
//! sized from `TRANSCODE_CONCURRENCY`. Within a job the ladder is encoded one
//! rung at a time and the first failure is terminal:
//!
//! ```text
//! Queued -> Running(240p) -> ... -> Running(1080p) -> Completed
//! Running(rung) -> Failed(rung, reason)
//! ```
//!
//! Partial outputs are left in place and the original is never touched.

mod ffmpeg;
mod ladder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{JobStatus, TranscodeJob};
use crate::services::storage::{self, MediaStorage};

pub use ffmpeg::{FfmpegEncoder, SEGMENT_SECONDS, hls_args};
pub use ladder::{LADDER, Quality, Rung, find_rung};

/// Pending ids held in memory. Ids beyond this stay queued in the database
/// until the next boot resumes them.
const QUEUE_CAPACITY: usize = 1024;

/// Where one rung's playlist and segments go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeTarget {
    /// Absolute rendition directory, e.g. `<root>/videos/transcoded/720p`.
    pub dir: PathBuf,
    /// Source file name without extension.
    pub stem: String,
}

impl EncodeTarget {
    pub fn playlist(&self) -> PathBuf {
        self.dir.join(format!("{}.m3u8", self.stem))
    }
}

/// Produces one rendition of a source file.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, source: &Path, rung: &Rung, target: &EncodeTarget) -> AppResult<()>;
}

/// Persistence for job state transitions.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn load_job(&self, id: i32) -> AppResult<Option<TranscodeJob>>;
    async fn mark_running(&self, id: i32, rung: &str) -> AppResult<()>;
    async fn mark_completed(&self, id: i32) -> AppResult<()>;
    async fn mark_failed(&self, id: i32, rung: &str, reason: &str) -> AppResult<()>;
}

#[async_trait]
impl JobStore for DbPool {
    async fn load_job(&self, id: i32) -> AppResult<Option<TranscodeJob>> {
        self.get_transcode_job(id).await
    }

    async fn mark_running(&self, id: i32, rung: &str) -> AppResult<()> {
        self.update_transcode_job(id, JobStatus::Running, Some(rung), None)
            .await
    }

    async fn mark_completed(&self, id: i32) -> AppResult<()> {
        self.update_transcode_job(id, JobStatus::Completed, None, None)
            .await
    }

    async fn mark_failed(&self, id: i32, rung: &str, reason: &str) -> AppResult<()> {
        self.update_transcode_job(id, JobStatus::Failed, Some(rung), Some(reason))
            .await
    }
}

/// Runs a single job through the ladder.
#[derive(Clone)]
pub struct TranscodeWorker {
    store: Arc<dyn JobStore>,
    encoder: Arc<dyn Encoder>,
    storage: MediaStorage,
}

impl TranscodeWorker {
    pub fn new(store: Arc<dyn JobStore>, encoder: Arc<dyn Encoder>, storage: MediaStorage) -> Self {
        Self {
            store,
            encoder,
            storage,
        }
    }

    /// Encode every rung for `job_id` and record the terminal state.
    pub async fn run_job(&self, job_id: i32) -> AppResult<JobStatus> {
        let job = self
            .store
            .load_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transcode job {}", job_id)))?;

        if job.status == JobStatus::Completed {
            return Ok(JobStatus::Completed);
        }

        let source = self.storage.absolute(&job.source_path);
        if !self.storage.exists(&job.source_path).await {
            let first = LADDER[0].label;
            let reason = format!("source file {} is missing", job.source_path);
            warn!(job_id, rung = first, %reason, "Transcode job failed");
            self.store.mark_failed(job_id, first, &reason).await?;
            return Ok(JobStatus::Failed);
        }

        info!(job_id, source = %job.source_path, "Transcode job started");

        for rung in LADDER.iter() {
            self.store.mark_running(job_id, rung.label).await?;

            let paths = storage::rendition_path(rung.label, &job.source_path);
            let dir = self.storage.absolute(&paths.dir);
            tokio::fs::create_dir_all(&dir).await?;
            let target = EncodeTarget {
                dir,
                stem: storage::file_stem(&job.source_path).to_string(),
            };

            info!(job_id, rung = rung.label, "Encoding rung");
            if let Err(e) = self.encoder.encode(&source, rung, &target).await {
                let reason = e.to_string();
                error!(job_id, rung = rung.label, error = %reason, "Transcode job failed");
                self.store.mark_failed(job_id, rung.label, &reason).await?;
                return Ok(JobStatus::Failed);
            }
        }

        self.store.mark_completed(job_id).await?;
        info!(job_id, "Transcode job completed");
        Ok(JobStatus::Completed)
    }
}

/// Sending side of the job channel, shared with request handlers.
#[derive(Clone)]
pub struct TranscodeQueue {
    sender: mpsc::Sender<i32>,
}

impl TranscodeQueue {
    /// Spawn the dispatcher and return a handle for enqueueing job ids.
    pub fn start(worker: TranscodeWorker, concurrency: usize) -> Self {
        Self::start_with_capacity(worker, concurrency, QUEUE_CAPACITY)
    }

    fn start_with_capacity(worker: TranscodeWorker, concurrency: usize, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<i32>(capacity.max(1));
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));

        tokio::spawn(async move {
            info!(concurrency, "Transcode dispatcher started");
            while let Some(job_id) = receiver.recv().await {
                let permit = match permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let worker = worker.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = worker.run_job(job_id).await {
                        error!(job_id, error = %e, "Transcode job could not be processed");
                    }
                });
            }
            info!("Transcode dispatcher stopped");
        });

        Self { sender }
    }

    /// Hand a persisted job to the dispatcher without waiting.
    ///
    /// A full channel leaves the job `queued` in the database for
    /// `resume_unfinished` to pick up on the next boot.
    pub fn enqueue(&self, job_id: i32) -> AppResult<()> {
        match self.sender.try_send(job_id) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(job_id, "Transcode queue is full, job will run after the next restart");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(AppError::Storage("Transcode queue is closed".to_string()))
            }
        }
    }
}

/// Re-enqueue jobs left queued or running by a previous process.
pub async fn resume_unfinished(pool: &DbPool, queue: &TranscodeQueue) -> AppResult<usize> {
    let jobs = pool.list_unfinished_transcode_jobs().await?;
    let count = jobs.len();
    for job in jobs {
        queue
            .sender
            .send(job.id)
            .await
            .map_err(|_| AppError::Storage("Transcode queue is closed".to_string()))?;
    }
    if count > 0 {
        info!(count, "Resumed unfinished transcode jobs");
    }
    Ok(count)
}
