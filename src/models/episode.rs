//! Episode DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::episode;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EpisodeResponse {
    pub id: i32,
    pub content_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub episode_number: i32,
    pub season_number: i32,
    pub video_path: String,
    /// Seconds.
    pub duration: i32,
    pub thumbnail_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<episode::Model> for EpisodeResponse {
    fn from(m: episode::Model) -> Self {
        Self {
            id: m.id,
            content_id: m.content_id,
            title: m.title,
            description: m.description,
            kind: "episode",
            episode_number: m.episode_number,
            season_number: m.season_number,
            video_path: m.video_path,
            duration: m.duration,
            thumbnail_url: m.thumbnail_url,
            release_date: m.release_date,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Body for creating or updating a single episode.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EpisodeRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub episode_number: i32,
    #[serde(default = "default_season_number")]
    pub season_number: i32,
    /// Path of an already stored original; normalized under `videos/original/`.
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    /// Normalized under `thumbnails/episodes/`.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

pub(crate) fn default_season_number() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EpisodeListQuery {
    /// Only episodes of this season.
    pub season: Option<i32>,
}
