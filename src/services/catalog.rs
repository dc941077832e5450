//! Content create/update from multipart forms, with upsert-on-title.
//!
//! The whole submission is applied in one transaction: the content row, its
//! genre set, its episodes and their links, and the transcode jobs for any
//! uploaded episode videos. Jobs are handed to the queue only after commit.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use sea_orm::TransactionTrait;
use tracing::{info, warn};

use crate::db::contents::{self, find_active_by_title};
use crate::db::episodes::{self, NewEpisode};
use crate::db::links::{self, NewDownloadLink, NewStreamLink};
use crate::db::taxonomy::category_name_exists;
use crate::db::transcode_jobs::insert_transcode_job;
use crate::error::{AppError, AppResult};
use crate::models::{ContentForm, ContentWithRelations, EpisodeInput, LinkKind, Relations};
use crate::services::embed;
use crate::services::intake::{self, FormParts, MediaIntake};
use crate::services::storage::{MediaDir, normalize_admin_path};

/// File field carrying the cover image.
pub const COVER_FIELD: &str = "coverImage";

/// Fields of the content form that hold images rather than video.
pub const IMAGE_FIELDS: &[&str] = &[COVER_FIELD];

/// Which row a submission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertTarget {
    /// Insert, or update the active content with the same title.
    Create,
    /// Update the content with this id.
    Update(i32),
}

#[derive(Debug)]
pub struct UpsertOutcome {
    pub content: ContentWithRelations,
    /// False when an existing row was updated.
    pub created: bool,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(parts: &FormParts, names: &[&str]) -> AppResult<Option<T>> {
    for name in names {
        if let Some(raw) = non_empty(parts.text(name)) {
            return raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| AppError::InvalidInput(format!("Invalid {}: {}", name, raw)));
        }
    }
    Ok(None)
}

fn parse_release_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::InvalidInput(format!("Invalid releaseDate: {}", raw)))
}

/// Collect genre ids from repeated `genreIds`/`genreIds[]` fields, each holding
/// an integer or a JSON array. `None` when no ids were submitted.
fn parse_genre_ids(parts: &FormParts) -> AppResult<Option<Vec<i32>>> {
    let mut ids = Vec::new();
    for raw in parts.texts("genreIds").chain(parts.texts("genreIds[]")) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        if raw.starts_with('[') {
            let list: Vec<i32> = serde_json::from_str(raw)
                .map_err(|e| AppError::InvalidInput(format!("Invalid genreIds: {}", e)))?;
            ids.extend(list);
        } else {
            for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let id = piece
                    .parse::<i32>()
                    .map_err(|_| AppError::InvalidInput(format!("Invalid genre id: {}", piece)))?;
                ids.push(id);
            }
        }
    }
    Ok((!ids.is_empty()).then_some(ids))
}

/// Parse the text fields of a content form.
pub fn parse_content_form(parts: &FormParts) -> AppResult<ContentForm> {
    let episodes = match non_empty(parts.text("episodes")) {
        Some(raw) => Some(
            serde_json::from_str::<Vec<EpisodeInput>>(raw)
                .map_err(|e| AppError::InvalidInput(format!("Failed to parse episodes: {}", e)))?,
        ),
        None => None,
    };

    Ok(ContentForm {
        title: non_empty(parts.text("title")).map(str::to_string),
        description: parts.text("description").map(|d| d.trim().to_string()),
        content_type: non_empty(parts.text("type")).map(str::to_string),
        release_date: non_empty(parts.text("releaseDate"))
            .map(parse_release_date)
            .transpose()?,
        genre_ids: parse_genre_ids(parts)?,
        rating: parse_number(parts, &["rating"])?,
        duration: parse_number(parts, &["duration"])?,
        season_id: parse_number(parts, &["season_id", "seasonId"])?,
        episodes,
    })
}

/// Reject submissions that list the same `(season, episode)` twice.
pub fn check_unique_coordinates(episodes: &[EpisodeInput]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for ep in episodes {
        if !seen.insert((ep.season_number, ep.episode_number)) {
            return Err(AppError::InvalidInput(format!(
                "Episode S{}E{} is listed more than once",
                ep.season_number, ep.episode_number
            )));
        }
    }
    Ok(())
}

/// Apply a content form and clean up its staged files.
pub async fn upsert_content(
    intake: &MediaIntake,
    target: UpsertTarget,
    mut parts: FormParts,
) -> AppResult<UpsertOutcome> {
    let result = apply_form(intake, target, &mut parts).await;
    parts.cleanup().await;
    result
}

async fn apply_form(
    intake: &MediaIntake,
    target: UpsertTarget,
    parts: &mut FormParts,
) -> AppResult<UpsertOutcome> {
    let form = parse_content_form(parts)?;
    let pool = intake.pool();
    let storage = intake.storage();

    if target == UpsertTarget::Create && form.title.is_none() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    if let Some(ref content_type) = form.content_type
        && !category_name_exists(pool.connection(), content_type).await?
    {
        return Err(AppError::InvalidInput(format!(
            "Unknown content type '{}'",
            content_type
        )));
    }
    if let Some(ref episodes) = form.episodes {
        check_unique_coordinates(episodes)?;
    }

    let txn = pool
        .connection()
        .begin()
        .await
        .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

    let existing = match target {
        UpsertTarget::Create => match form.title {
            Some(ref title) => find_active_by_title(&txn, title).await?,
            None => None,
        },
        UpsertTarget::Update(id) => {
            let found = contents::find_active(&txn, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Content {}", id)))?;
            if let Some(ref title) = form.title
                && let Some(other) = find_active_by_title(&txn, title).await?
                && other.id != id
            {
                return Err(AppError::InvalidInput(format!(
                    "Content titled '{}' already exists",
                    title
                )));
            }
            Some(found)
        }
    };

    let created = existing.is_none();
    let mut content = match existing {
        Some(model) => contents::update_content(&txn, model, &form).await?,
        None => contents::insert_content(&txn, &form).await?,
    };
    let content_id = content.id;

    if let Some(ref genre_ids) = form.genre_ids {
        contents::replace_genres(&txn, content_id, genre_ids).await?;
    }

    let mut jobs = Vec::new();
    if let Some(episodes) = form.episodes {
        episodes::purge_content_episodes(&txn, content_id).await?;
        for input in episodes {
            jobs.extend(create_episode(intake, &txn, content_id, input, parts).await?);
        }
    }

    if let Some(file) = parts.take_file(COVER_FIELD) {
        let relative = intake::store_cover(storage, content_id, file).await?;
        content = contents::set_cover_image(&txn, content, &relative).await?;
    } else if let Some(raw) = non_empty(parts.text(COVER_FIELD)) {
        if let Some(relative) = normalize_admin_path(raw, MediaDir::ContentThumbnails) {
            content = contents::set_cover_image(&txn, content, &relative).await?;
        }
    }

    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit content: {}", e)))?;

    for job_id in &jobs {
        if let Err(e) = intake.queue().enqueue(*job_id) {
            warn!(job_id, error = %e, "Failed to enqueue transcode job, it will resume on restart");
        }
    }

    info!(
        content_id,
        title = %content.title,
        created,
        jobs = jobs.len(),
        "Content saved"
    );

    let content = pool
        .get_content(content_id, Relations::ALL)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {}", content_id)))?;
    Ok(UpsertOutcome { content, created })
}

/// Insert one submitted episode with its links. Returns the ids of transcode
/// jobs created for uploaded videos.
async fn create_episode<C: sea_orm::ConnectionTrait>(
    intake: &MediaIntake,
    db: &C,
    content_id: i32,
    input: EpisodeInput,
    parts: &mut FormParts,
) -> AppResult<Vec<i32>> {
    let season_number = input.season_number;
    let episode_number = input.episode_number;
    let mut episode = episodes::insert_episode(
        db,
        NewEpisode {
            content_id,
            title: input.title,
            description: input.description,
            episode_number,
            season_number,
            video_path: String::new(),
            duration: input.duration.unwrap_or(0),
            thumbnail_url: None,
            release_date: None,
        },
    )
    .await?;

    let mut jobs = Vec::new();
    for link in input.stream_links {
        let kind = LinkKind::parse_lenient(link.kind.as_deref());
        let base = NewStreamLink {
            content_id,
            episode_id: Some(episode.id),
            season_number: Some(season_number),
            episode_number: Some(episode_number),
            name: link.name,
            quality: link.quality,
            kind,
            provider: None,
            server: String::new(),
            url: String::new(),
        };

        if kind == LinkKind::Embed {
            let ingested = embed::ingest(&link.url)?;
            links::insert_stream_link(
                db,
                NewStreamLink {
                    provider: ingested.provider.map(|p| p.as_str().to_string()),
                    server: "external".to_string(),
                    url: ingested.url,
                    ..base
                },
            )
            .await?;
            continue;
        }

        let staged = link
            .video_field
            .as_deref()
            .filter(|f| !f.is_empty())
            .and_then(|f| parts.take_file(f));

        let (relative, uploaded) = match staged {
            Some(file) => (
                intake::store_original(intake.storage(), content_id, file).await?,
                true,
            ),
            None => match normalize_admin_path(&link.url, MediaDir::Originals) {
                Some(existing) => (existing, false),
                None => {
                    warn!(
                        content_id,
                        season_number,
                        episode_number,
                        field = ?link.video_field,
                        "No video file for self-hosted link, skipping"
                    );
                    continue;
                }
            },
        };

        episode = episodes::set_video_path(db, episode, &relative).await?;
        links::insert_stream_link(
            db,
            NewStreamLink {
                server: "local".to_string(),
                url: relative.clone(),
                ..base
            },
        )
        .await?;

        if uploaded {
            let job = insert_transcode_job(db, content_id, Some(episode.id), &relative).await?;
            jobs.push(job.id);
        }
    }

    for link in input.download_links {
        links::insert_download_link(
            db,
            NewDownloadLink {
                content_id,
                episode_id: Some(episode.id),
                season_number: Some(season_number),
                episode_number: Some(episode_number),
                server: link.name.clone(),
                name: link.name,
                quality: link.quality,
                url: link.url,
            },
        )
        .await?;
    }

    Ok(jobs)
}
