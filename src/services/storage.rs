//! On-disk media layout.
//!
//! All files live under a single media root:
//!
//! ```text
//! thumbnails/content/<contentId>_cover<ext>
//! thumbnails/episodes/<episodeId>_thumbnail<ext>
//! videos/original/<contentId>_<unixSeconds>.mp4
//! videos/transcoded/<quality>/<stem>.m3u8
//! videos/transcoded/<quality>/<stem>_%03d.ts
//! ```
//!
//! Database rows store paths relative to the root with forward slashes.
//! Nothing outside this module joins user input onto the root.

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::services::transcoder::LADDER;

pub const CONTENT_THUMBNAILS_DIR: &str = "thumbnails/content";
pub const EPISODE_THUMBNAILS_DIR: &str = "thumbnails/episodes";
pub const ORIGINALS_DIR: &str = "videos/original";
pub const TRANSCODED_DIR: &str = "videos/transcoded";

/// Prefixes admins tend to paste in front of stored paths.
const LEGACY_PREFIXES: &[&str] = &["media/", "thumbnails/", "videos/"];

/// Canonical directory a normalized path is rewritten into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDir {
    ContentThumbnails,
    EpisodeThumbnails,
    Originals,
}

impl MediaDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentThumbnails => CONTENT_THUMBNAILS_DIR,
            Self::EpisodeThumbnails => EPISODE_THUMBNAILS_DIR,
            Self::Originals => ORIGINALS_DIR,
        }
    }
}

/// Relative locations of one rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionPaths {
    /// Directory holding the playlist and its segments.
    pub dir: String,
    /// `<dir>/<stem>.m3u8`
    pub playlist: String,
    /// `<dir>/<stem>_%03d.ts`, in the form the encoder expects.
    pub segment_pattern: String,
}

pub fn cover_path(content_id: i32, ext: &str) -> String {
    format!("{}/{}_cover{}", CONTENT_THUMBNAILS_DIR, content_id, ext)
}

pub fn episode_thumb_path(episode_id: i32, ext: &str) -> String {
    format!("{}/{}_thumbnail{}", EPISODE_THUMBNAILS_DIR, episode_id, ext)
}

pub fn original_video_path(content_id: i32, timestamp: i64) -> String {
    format!("{}/{}_{}.mp4", ORIGINALS_DIR, content_id, timestamp)
}

/// Rendition layout for `filename` (an original's file name, with or without directories).
pub fn rendition_path(quality: &str, filename: &str) -> RenditionPaths {
    let stem = file_stem(filename);
    let dir = format!("{}/{}", TRANSCODED_DIR, quality);
    RenditionPaths {
        playlist: format!("{}/{}.m3u8", dir, stem),
        segment_pattern: format!("{}/{}_%03d.ts", dir, stem),
        dir,
    }
}

/// Last path segment with the final extension removed.
pub fn file_stem(filename: &str) -> &str {
    let base = basename(filename);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Rewrite an admin-supplied path under the canonical directory.
///
/// Known prefixes are stripped and the remainder reduced to its basename, so
/// `media\thumbnails\content\1_cover.jpg`, `../../etc/passwd` and `1_cover.jpg`
/// all land directly inside `dir`. Returns `None` when nothing usable remains.
pub fn normalize_admin_path(input: &str, dir: MediaDir) -> Option<String> {
    let mut rest = input.trim().replace('\\', "/");
    loop {
        let trimmed = rest.trim_start_matches('/');
        match LEGACY_PREFIXES.iter().find(|p| trimmed.starts_with(*p)) {
            Some(prefix) => rest = trimmed[prefix.len()..].to_string(),
            None => {
                rest = trimmed.to_string();
                break;
            }
        }
    }

    let base = basename(&rest);
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(format!("{}/{}", dir.as_str(), base))
}

/// Lowercased extension of an uploaded file name, including the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let base = basename(filename);
    let idx = base.rfind('.')?;
    if idx == 0 || idx + 1 == base.len() {
        return None;
    }
    let ext = &base[idx..];
    if ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

/// Handle to the media root.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory tree, including one directory per ladder rung.
    pub async fn ensure_layout(&self) -> AppResult<()> {
        let mut dirs: Vec<PathBuf> = vec![
            self.root.clone(),
            self.root.join("thumbnails"),
            self.root.join(CONTENT_THUMBNAILS_DIR),
            self.root.join(EPISODE_THUMBNAILS_DIR),
            self.root.join("videos"),
            self.root.join(ORIGINALS_DIR),
            self.root.join(TRANSCODED_DIR),
        ];
        dirs.extend(
            LADDER
                .iter()
                .map(|rung| self.root.join(TRANSCODED_DIR).join(rung.label)),
        );

        for dir in &dirs {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Storage(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            set_traversable(dir).await?;
        }

        info!(root = %self.root.display(), "Media layout ready");
        Ok(())
    }

    /// Join a stored relative path onto the root.
    ///
    /// Backslashes are treated as separators, a leading `media/` is dropped, and
    /// any root, prefix or parent component is discarded.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        let cleaned = relative.replace('\\', "/");
        let cleaned = cleaned.trim_start_matches('/');
        let cleaned = cleaned.strip_prefix("media/").unwrap_or(cleaned);

        let mut path = self.root.clone();
        for component in Path::new(cleaned).components() {
            if let Component::Normal(part) = component {
                path.push(part);
            }
        }
        path
    }

    /// Absolute path for `relative` with its parent directory created.
    pub async fn prepare(&self, relative: &str) -> AppResult<PathBuf> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        Ok(path)
    }

    /// Whether `relative` names an existing regular file.
    pub async fn exists(&self, relative: &str) -> bool {
        tokio::fs::metadata(self.absolute(relative))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

#[cfg(unix)]
async fn set_traversable(dir: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| AppError::Storage(format!("Failed to chmod {}: {}", dir.display(), e)))
}

#[cfg(not(unix))]
async fn set_traversable(_dir: &Path) -> AppResult<()> {
    Ok(())
}
