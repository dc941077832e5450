//! Maps `(content, episode, quality)` to a file under the media root.

use std::path::PathBuf;

use tracing::debug;

use crate::db::DbPool;
use crate::entity::episode;
use crate::error::{AppError, AppResult};
use crate::services::storage::{self, MediaStorage, ORIGINALS_DIR};
use crate::services::transcoder::{Quality, Rung};

/// A resolved playable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Absolute path to serve.
    pub path: PathBuf,
    /// Original the request maps to, relative to the media root.
    pub original: String,
    /// Rung whose playlist `path` points at, `None` when serving the original.
    pub rendition: Option<&'static Rung>,
}

/// Relative original for a content/episode pair.
///
/// Episodes without a stored video fall back to `videos/original/<contentId>.mp4`,
/// the location used for movies.
pub fn original_for(content_id: i32, episode: Option<&episode::Model>) -> String {
    match episode {
        Some(ep) if !ep.video_path.trim().is_empty() => ep.video_path.replace('\\', "/"),
        Some(ep) => {
            debug!(
                content_id,
                episode_id = ep.id,
                "Episode has no video path, using movie location"
            );
            format!("{}/{}.mp4", ORIGINALS_DIR, content_id)
        }
        None => format!("{}/{}.mp4", ORIGINALS_DIR, content_id),
    }
}

/// Pick the rendition playlist when it exists, else the original.
pub async fn resolve_file(
    storage: &MediaStorage,
    content_id: i32,
    episode: Option<&episode::Model>,
    quality: Quality,
) -> Resolved {
    let original = original_for(content_id, episode);

    if let Quality::Rendition(rung) = quality {
        let paths = storage::rendition_path(rung.label, &original);
        if storage.exists(&paths.playlist).await {
            return Resolved {
                path: storage.absolute(&paths.playlist),
                original,
                rendition: Some(rung),
            };
        }
        debug!(
            content_id,
            quality = rung.label,
            "Rendition not produced yet, falling back to original"
        );
    }

    Resolved {
        path: storage.absolute(&original),
        original,
        rendition: None,
    }
}

/// Load the episode (when given), check ownership, then resolve.
pub async fn resolve(
    pool: &DbPool,
    storage: &MediaStorage,
    content_id: i32,
    episode_id: Option<i32>,
    quality: Quality,
) -> AppResult<Resolved> {
    if !pool.content_exists(content_id).await? {
        return Err(AppError::NotFound(format!("Content {}", content_id)));
    }

    let episode = match episode_id {
        Some(id) => {
            let episode = pool
                .find_episode(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Episode {}", id)))?;
            if episode.content_id != content_id {
                return Err(AppError::NotFound(format!(
                    "Episode {} of content {}",
                    id, content_id
                )));
            }
            Some(episode)
        }
        None => None,
    };

    Ok(resolve_file(storage, content_id, episode.as_ref(), quality).await)
}

/// Whether `file` is the playlist or one of the segments of `original`'s renditions.
pub fn is_rendition_file(original: &str, file: &str) -> bool {
    if file.is_empty() || file.contains(['/', '\\']) || file.starts_with('.') {
        return false;
    }
    let stem = storage::file_stem(original);
    if file == format!("{}.m3u8", stem) {
        return true;
    }
    file.strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".ts"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transcoder::find_rung;
    use chrono::Utc;

    fn episode(id: i32, content_id: i32, video_path: &str) -> episode::Model {
        episode::Model {
            id,
            content_id,
            title: "Pilot".to_string(),
            description: None,
            episode_number: 1,
            season_number: 1,
            video_path: video_path.to_string(),
            duration: 0,
            thumbnail_url: None,
            release_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_original_for() {
        let ep = episode(3, 7, "videos/original/7_1700000000.mp4");
        assert_eq!(original_for(7, Some(&ep)), "videos/original/7_1700000000.mp4");
        let legacy = episode(3, 7, "videos\\original\\7_1.mp4");
        assert_eq!(original_for(7, Some(&legacy)), "videos/original/7_1.mp4");
        let empty = episode(3, 7, "");
        assert_eq!(original_for(7, Some(&empty)), "videos/original/7.mp4");
        assert_eq!(original_for(7, None), "videos/original/7.mp4");
    }

    #[tokio::test]
    async fn test_falls_back_to_original_when_rendition_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let ep = episode(3, 7, "videos/original/7_100.mp4");

        let resolved = resolve_file(
            &storage,
            7,
            Some(&ep),
            Quality::Rendition(find_rung("720p").unwrap()),
        )
        .await;

        assert_eq!(resolved.rendition, None);
        assert_eq!(resolved.path, dir.path().join("videos/original/7_100.mp4"));
    }

    #[tokio::test]
    async fn test_prefers_existing_rendition() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let playlist = storage
            .prepare("videos/transcoded/480p/7_100.m3u8")
            .await
            .unwrap();
        tokio::fs::write(&playlist, b"#EXTM3U\n").await.unwrap();
        let ep = episode(3, 7, "videos/original/7_100.mp4");

        let resolved = resolve_file(
            &storage,
            7,
            Some(&ep),
            Quality::Rendition(find_rung("480p").unwrap()),
        )
        .await;
        assert_eq!(resolved.path, playlist);
        assert_eq!(resolved.rendition.map(|r| r.label), Some("480p"));

        let original = resolve_file(&storage, 7, Some(&ep), Quality::Original).await;
        assert_eq!(original.rendition, None);
    }

    #[test]
    fn test_rendition_file_membership() {
        let original = "videos/original/7_100.mp4";
        assert!(is_rendition_file(original, "7_100.m3u8"));
        assert!(is_rendition_file(original, "7_100_000.ts"));
        assert!(is_rendition_file(original, "7_100_123.ts"));
        assert!(!is_rendition_file(original, "7_101.m3u8"));
        assert!(!is_rendition_file(original, "7_100_.ts"));
        assert!(!is_rendition_file(original, "7_100_abc.ts"));
        assert!(!is_rendition_file(original, "../7_100.m3u8"));
        assert!(!is_rendition_file(original, "7_100.mp4"));
    }
}
