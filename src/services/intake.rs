//! Upload intake.
//!
//! Multipart bodies are streamed part by part into a per-request staging
//! directory under the media root, with a byte cap per part. Accepted files are
//! then renamed into the canonical layout, so a final path never holds a
//! half-written upload.

use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MediaSettings;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::TranscodeJob;
use crate::services::storage::{self, MediaStorage};
use crate::services::transcoder::TranscodeQueue;

/// Staging directory name under the media root.
const STAGING_DIR: &str = ".incoming";

/// Accepted cover and thumbnail extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// Attempts at finding a free `<contentId>_<seconds>.mp4` name.
const NAME_ATTEMPTS: i64 = 120;

/// Byte caps applied while reading a multipart body.
#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    /// Cap for video file parts.
    pub max_video_size: u64,
    /// Cap for text fields and image parts.
    pub max_field_size: u64,
}

impl From<&MediaSettings> for IntakeLimits {
    fn from(media: &MediaSettings) -> Self {
        Self {
            max_video_size: media.max_video_size as u64,
            max_field_size: media.max_field_size as u64,
        }
    }
}

/// A file part written to staging.
#[derive(Debug)]
pub struct StagedFile {
    /// Form field the part arrived in.
    pub field: String,
    /// Client-supplied file name.
    pub filename: String,
    pub temp_path: PathBuf,
    pub size: u64,
}

/// Text fields and staged files of one multipart body.
#[derive(Debug)]
pub struct FormParts {
    fields: Vec<(String, String)>,
    files: Vec<StagedFile>,
    staging: PathBuf,
}

impl FormParts {
    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated text field.
    pub fn texts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_file(&self, field: &str) -> bool {
        self.files.iter().any(|f| f.field == field)
    }

    /// Remove and return the staged file for `field`.
    pub fn take_file(&mut self, field: &str) -> Option<StagedFile> {
        let idx = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(idx))
    }

    /// Delete the staging directory and anything left in it.
    pub async fn cleanup(self) {
        remove_staging(&self.staging).await;
    }

    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: Vec::new(),
            staging: PathBuf::new(),
        }
    }
}

async fn remove_staging(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(dir = %dir.display(), error = %e, "Failed to cleanup staging directory");
    }
}

/// Read a multipart body, streaming file parts to disk.
///
/// File parts whose field is listed in `image_fields` are capped at the field
/// limit; every other file part is treated as video. The first part to exceed
/// its cap aborts the whole read and nothing is kept.
pub async fn read_form(
    payload: &mut Multipart,
    storage: &MediaStorage,
    limits: IntakeLimits,
    image_fields: &[&str],
) -> AppResult<FormParts> {
    let staging = storage
        .root()
        .join(STAGING_DIR)
        .join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&staging).await.map_err(|e| {
        AppError::Storage(format!("Failed to create staging directory: {}", e))
    })?;

    let mut parts = FormParts {
        fields: Vec::new(),
        files: Vec::new(),
        staging,
    };

    match read_parts(payload, &mut parts, limits, image_fields).await {
        Ok(()) => Ok(parts),
        Err(e) => {
            parts.cleanup().await;
            Err(e)
        }
    }
}

async fn read_parts(
    payload: &mut Multipart,
    parts: &mut FormParts,
    limits: IntakeLimits,
    image_fields: &[&str],
) -> AppResult<()> {
    let mut counter: u32 = 0;
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let disposition = field
            .content_disposition()
            .ok_or_else(|| AppError::InvalidInput("Missing content disposition".to_string()))?;
        let name = disposition
            .get_name()
            .ok_or_else(|| AppError::InvalidInput("Multipart field without a name".to_string()))?
            .to_string();
        let filename = disposition.get_filename().map(str::to_string);

        let Some(filename) = filename else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if (value.len() + chunk.len()) as u64 > limits.max_field_size {
                    return Err(AppError::InvalidInput(format!(
                        "Field '{}' exceeds {} bytes",
                        name, limits.max_field_size
                    )));
                }
                value.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(value).map_err(|_| {
                AppError::InvalidInput(format!("Field '{}' is not valid UTF-8", name))
            })?;
            parts.fields.push((name, value));
            continue;
        };

        let cap = if image_fields.contains(&name.as_str()) {
            limits.max_field_size
        } else {
            limits.max_video_size
        };

        let temp_path = parts.staging.join(format!("part_{}", counter));
        counter += 1;
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create staging file: {}", e)))?;

        let mut size: u64 = 0;
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > cap {
                warn!(field = %name, filename = %filename, cap, "Upload exceeds size limit");
                return Err(AppError::InvalidInput(format!(
                    "File '{}' exceeds the maximum size of {} MiB",
                    filename,
                    cap / (1024 * 1024)
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to write staging file: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush staging file: {}", e)))?;

        debug!(field = %name, filename = %filename, size, "Staged upload");
        parts.files.push(StagedFile {
            field: name,
            filename,
            temp_path,
            size,
        });
    }
    Ok(())
}

/// Move a staged video to a fresh `videos/original/<contentId>_<seconds>.mp4`.
///
/// The name is claimed with an exclusive create, bumping the timestamp when a
/// second upload for the same content lands in the same second.
pub async fn store_original(
    storage: &MediaStorage,
    content_id: i32,
    file: StagedFile,
) -> AppResult<String> {
    if file.size == 0 {
        return Err(AppError::InvalidInput("Video file is empty".to_string()));
    }

    let base = Utc::now().timestamp();
    for offset in 0..NAME_ATTEMPTS {
        let relative = storage::original_video_path(content_id, base + offset);
        let target = storage.prepare(&relative).await?;
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(_) => {
                tokio::fs::rename(&file.temp_path, &target)
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to store video: {}", e)))?;
                info!(content_id, path = %relative, size = file.size, "Stored original video");
                return Ok(relative);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to create {}: {}",
                    target.display(),
                    e
                )));
            }
        }
    }

    Err(AppError::Storage(format!(
        "No free original name for content {}",
        content_id
    )))
}

fn image_extension(file: &StagedFile) -> AppResult<String> {
    storage::extension_of(&file.filename)
        .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unsupported image type '{}', expected one of {}",
                file.filename,
                IMAGE_EXTENSIONS.join(" ")
            ))
        })
}

/// Move a staged image to `relative`, replacing any previous file.
async fn store_image(storage: &MediaStorage, relative: &str, file: StagedFile) -> AppResult<()> {
    let target = storage.prepare(relative).await?;
    tokio::fs::rename(&file.temp_path, &target)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to store image: {}", e)))?;
    info!(path = %relative, size = file.size, "Stored image");
    Ok(())
}

/// Move a staged cover to `thumbnails/content/<contentId>_cover<ext>`.
pub async fn store_cover(
    storage: &MediaStorage,
    content_id: i32,
    file: StagedFile,
) -> AppResult<String> {
    let ext = image_extension(&file)?;
    let relative = storage::cover_path(content_id, &ext);
    store_image(storage, &relative, file).await?;
    Ok(relative)
}

/// Video, cover and thumbnail intake bound to the catalog and the transcode queue.
#[derive(Clone)]
pub struct MediaIntake {
    pool: DbPool,
    storage: MediaStorage,
    queue: TranscodeQueue,
    limits: IntakeLimits,
}

impl MediaIntake {
    pub fn new(pool: DbPool, storage: MediaStorage, queue: TranscodeQueue, limits: IntakeLimits) -> Self {
        Self {
            pool,
            storage,
            queue,
            limits,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn storage(&self) -> &MediaStorage {
        &self.storage
    }

    pub fn queue(&self) -> &TranscodeQueue {
        &self.queue
    }

    pub fn limits(&self) -> IntakeLimits {
        self.limits
    }

    /// Store an original, point the episode at it and queue transcoding.
    ///
    /// Returns once the file is on disk; encoding happens in the background.
    pub async fn upload_video(
        &self,
        content_id: i32,
        episode_id: Option<i32>,
        file: StagedFile,
    ) -> AppResult<(String, TranscodeJob)> {
        if !self.pool.content_exists(content_id).await? {
            return Err(AppError::InvalidInput(format!(
                "Unknown content id {}",
                content_id
            )));
        }
        if let Some(episode_id) = episode_id {
            let owned = self
                .pool
                .get_episode(content_id, episode_id)
                .await?
                .is_some();
            if !owned {
                return Err(AppError::InvalidInput(format!(
                    "Unknown episode id {} for content {}",
                    episode_id, content_id
                )));
            }
        }

        let relative = store_original(&self.storage, content_id, file).await?;

        if let Some(episode_id) = episode_id {
            self.pool
                .update_episode_video_path(episode_id, &relative)
                .await?;
        }

        let job = self
            .pool
            .create_transcode_job(content_id, episode_id, &relative)
            .await?;
        self.queue.enqueue(job.id)?;
        info!(content_id, ?episode_id, job_id = job.id, path = %relative, "Video accepted");

        Ok((relative, job))
    }

    /// Store a cover image and record it on the content.
    pub async fn upload_cover(&self, content_id: i32, file: StagedFile) -> AppResult<String> {
        if !self.pool.content_exists(content_id).await? {
            return Err(AppError::InvalidInput(format!(
                "Unknown content id {}",
                content_id
            )));
        }
        let relative = store_cover(&self.storage, content_id, file).await?;
        self.pool.update_content_cover(content_id, &relative).await?;
        Ok(relative)
    }

    /// Store an episode thumbnail and record it on the episode.
    pub async fn upload_episode_thumb(&self, episode_id: i32, file: StagedFile) -> AppResult<String> {
        if self.pool.find_episode(episode_id).await?.is_none() {
            return Err(AppError::InvalidInput(format!(
                "Unknown episode id {}",
                episode_id
            )));
        }
        let ext = image_extension(&file)?;
        let relative = storage::episode_thumb_path(episode_id, &ext);
        store_image(&self.storage, &relative, file).await?;
        self.pool
            .update_episode_thumbnail(episode_id, &relative)
            .await?;
        Ok(relative)
    }
}
