//! Content domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::episode::default_season_number;
use super::{CategoryResponse, DownloadLinkResponse, EpisodeResponse, GenreResponse, StreamLinkResponse};
use crate::entity::{category, content, download_link, episode, genre, stream_link};

/// Which relations to load alongside a content row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relations {
    pub episodes: bool,
    pub genres: bool,
    pub categories: bool,
    pub stream_links: bool,
    pub download_links: bool,
}

impl Relations {
    pub const NONE: Relations = Relations {
        episodes: false,
        genres: false,
        categories: false,
        stream_links: false,
        download_links: false,
    };

    pub const ALL: Relations = Relations {
        episodes: true,
        genres: true,
        categories: true,
        stream_links: true,
        download_links: true,
    };

    /// What list endpoints return per row.
    pub const LISTING: Relations = Relations {
        genres: true,
        ..Relations::NONE
    };

    /// Parse a comma separated relation list such as `episodes,genres`.
    /// Unknown names are ignored; `all` selects everything.
    pub fn parse(list: &str) -> Self {
        let mut rel = Relations::NONE;
        for name in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
            match name.as_str() {
                "all" => return Relations::ALL,
                "episodes" => rel.episodes = true,
                "genres" => rel.genres = true,
                "categories" => rel.categories = true,
                "stream_links" | "streamlinks" => rel.stream_links = true,
                "download_links" | "downloadlinks" => rel.download_links = true,
                _ => {}
            }
        }
        rel
    }
}

/// A content row plus whichever relations were requested.
#[derive(Debug, Clone)]
pub struct ContentWithRelations {
    pub content: content::Model,
    pub episodes: Vec<episode::Model>,
    pub genres: Vec<genre::Model>,
    pub categories: Vec<category::Model>,
    pub stream_links: Vec<stream_link::Model>,
    pub download_links: Vec<download_link::Model>,
}

impl ContentWithRelations {
    pub fn bare(content: content::Model) -> Self {
        Self {
            content,
            episodes: Vec::new(),
            genres: Vec::new(),
            categories: Vec::new(),
            stream_links: Vec::new(),
            download_links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: String,
    pub cover_image: Option<String>,
    pub release_date: Option<NaiveDate>,
    /// Minutes.
    pub duration: Option<i32>,
    pub rating: f32,
    pub season_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<EpisodeResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<GenreResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryResponse>,
    pub stream_links: Vec<StreamLinkResponse>,
    pub download_links: Vec<DownloadLinkResponse>,
}

impl From<ContentWithRelations> for ContentResponse {
    fn from(c: ContentWithRelations) -> Self {
        let m = c.content;
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            content_type: m.content_type,
            cover_image: m.cover_image,
            release_date: m.release_date,
            duration: m.duration,
            rating: m.rating,
            season_id: m.season_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            episodes: c.episodes.into_iter().map(Into::into).collect(),
            genres: c.genres.into_iter().map(Into::into).collect(),
            categories: c.categories.into_iter().map(Into::into).collect(),
            stream_links: c.stream_links.into_iter().map(Into::into).collect(),
            download_links: c.download_links.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentListResponse {
    pub contents: Vec<ContentResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Response for create/update.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContentMutationResponse {
    pub message: String,
    pub content: ContentResponse,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListContentsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Only contents whose type tag equals this value.
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    /// Only contents whose type tag equals this category's name.
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive title substring.
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IncludeQuery {
    /// Comma separated relations to embed (default: all).
    pub include: Option<String>,
}

impl IncludeQuery {
    pub fn relations(&self) -> Relations {
        self.include
            .as_deref()
            .map(Relations::parse)
            .unwrap_or(Relations::ALL)
    }
}

/// Stream link entry inside the `episodes` form field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamLinkInput {
    #[serde(default)]
    pub name: String,
    /// `embed` (default) or `self-hosted`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub url: String,
    /// Multipart field carrying the video for self-hosted links.
    #[serde(default)]
    pub video_field: Option<String>,
}

/// Download link entry inside the `episodes` form field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinkInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub url: String,
}

/// One element of the `episodes` JSON form field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub episode_number: i32,
    #[serde(default = "default_season_number")]
    pub season_number: i32,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub stream_links: Vec<StreamLinkInput>,
    #[serde(default)]
    pub download_links: Vec<DownloadLinkInput>,
}

/// Parsed non-file fields of a content create/update form.
///
/// `None` means the field was not submitted; on update it leaves the stored
/// value alone.
#[derive(Debug, Clone, Default)]
pub struct ContentForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genre_ids: Option<Vec<i32>>,
    pub rating: Option<f32>,
    pub duration: Option<i32>,
    pub season_id: Option<i32>,
    pub episodes: Option<Vec<EpisodeInput>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relations_parse() {
        let rel = Relations::parse("episodes, Genres,bogus");
        assert!(rel.episodes && rel.genres);
        assert!(!rel.categories && !rel.stream_links && !rel.download_links);
        assert_eq!(Relations::parse("all"), Relations::ALL);
        assert_eq!(Relations::parse(""), Relations::NONE);
    }

    #[test]
    fn test_include_defaults_to_all() {
        assert_eq!(IncludeQuery::default().relations(), Relations::ALL);
    }

    #[test]
    fn test_episode_input_defaults() {
        let eps: Vec<EpisodeInput> = serde_json::from_str(
            r#"[{"title":"Pilot","episodeNumber":1,
                 "streamLinks":[{"name":"Local","type":"self-hosted","quality":"720p","videoField":"ep1"}],
                 "downloadLinks":[{"name":"Mega","quality":"1080p","url":"https://mega.test/x"}]}]"#,
        )
        .unwrap();
        assert_eq!(eps[0].season_number, 1);
        assert_eq!(eps[0].stream_links[0].video_field.as_deref(), Some("ep1"));
        assert_eq!(eps[0].stream_links[0].kind.as_deref(), Some("self-hosted"));
        assert_eq!(eps[0].download_links[0].name, "Mega");
    }
}
