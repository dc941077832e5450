//! ffmpeg-backed encoder.
//!
//! Each rung is written into a hidden staging directory next to its final
//! location. Segments are moved into place first and the playlist last, so a
//! reader never sees a playlist that points at missing segments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{EncodeTarget, Encoder, Rung};
use crate::error::{AppError, AppResult};

/// HLS segment length in seconds.
pub const SEGMENT_SECONDS: u32 = 10;

/// Lines of stderr kept in failure messages.
const STDERR_TAIL_LINES: usize = 20;

/// Encoder that shells out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    /// Create an encoder for the given binary, resolving it against `PATH`.
    ///
    /// A missing binary is not fatal here; jobs fail individually when they run.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        match which::which(&program) {
            Ok(resolved) => {
                info!(path = %resolved.display(), "ffmpeg found");
                Self { program: resolved }
            }
            Err(e) => {
                warn!(
                    program = %program.display(),
                    error = %e,
                    "ffmpeg not found, transcoding jobs will fail until it is installed"
                );
                Self { program }
            }
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Argument list for one rung.
pub fn hls_args(source: &Path, rung: &Rung, segment_pattern: &Path, playlist: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:v".to_string(),
        rung.bitrate(),
        "-s".to_string(),
        rung.resolution(),
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        SEGMENT_SECONDS.to_string(),
        "-hls_list_size".to_string(),
        "0".to_string(),
        "-hls_segment_filename".to_string(),
        segment_pattern.to_string_lossy().into_owned(),
        playlist.to_string_lossy().into_owned(),
    ]
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn staging_dir(target: &EncodeTarget) -> PathBuf {
    target.dir.join(format!(".{}.partial", target.stem))
}

/// Move finished outputs from `staging` into `target.dir`, playlist last.
async fn publish(staging: &Path, target: &EncodeTarget) -> AppResult<()> {
    let playlist_name = format!("{}.m3u8", target.stem);
    let mut entries = tokio::fs::read_dir(staging).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy() == playlist_name {
            continue;
        }
        tokio::fs::rename(entry.path(), target.dir.join(&name)).await?;
    }

    tokio::fs::rename(staging.join(&playlist_name), target.playlist()).await?;
    tokio::fs::remove_dir(staging).await?;
    Ok(())
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, source: &Path, rung: &Rung, target: &EncodeTarget) -> AppResult<()> {
        let staging = staging_dir(target);
        tokio::fs::create_dir_all(&staging).await?;

        let args = hls_args(
            source,
            rung,
            &staging.join(format!("{}_%03d.ts", target.stem)),
            &staging.join(format!("{}.m3u8", target.stem)),
        );
        debug!(rung = rung.label, args = ?args, "Spawning ffmpeg");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AppError::ExternalTool(format!(
                    "failed to spawn {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr);
            warn!(rung = rung.label, status = %output.status, stderr = %tail, "ffmpeg failed");
            return Err(AppError::ExternalTool(format!(
                "ffmpeg exited with {} for {}: {}",
                output.status, rung.label, tail
            )));
        }

        debug!(rung = rung.label, stderr = %stderr_tail(&output.stderr), "ffmpeg finished");
        publish(&staging, target).await
    }
}
