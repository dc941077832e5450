//! Stream and download link DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{download_link, stream_link};
use crate::services::embed;

/// How a stream link is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    /// Third-party player page.
    Embed,
    /// File under the media root, served by this server.
    SelfHosted,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::SelfHosted => "self-hosted",
        }
    }

    /// Parse a submitted kind; anything unrecognised is treated as an embed.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "self-hosted" || v == "self_hosted" || v == "selfhosted" => {
                Self::SelfHosted
            }
            _ => Self::Embed,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StreamLinkResponse {
    pub id: i32,
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub name: String,
    pub quality: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: Option<String>,
    pub server: String,
    pub url: String,
    /// Player markup, present only for allow-listed embed providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_html: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stream_link::Model> for StreamLinkResponse {
    fn from(m: stream_link::Model) -> Self {
        let embed_html = if m.kind == LinkKind::Embed.as_str() {
            embed::render(&m.url, m.provider.as_deref())
        } else {
            None
        };
        Self {
            id: m.id,
            content_id: m.content_id,
            episode_id: m.episode_id,
            season_number: m.season_number,
            episode_number: m.episode_number,
            name: m.name,
            quality: m.quality,
            kind: m.kind,
            provider: m.provider,
            server: m.server,
            url: m.url,
            embed_html,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DownloadLinkResponse {
    pub id: i32,
    pub content_id: i32,
    pub episode_id: Option<i32>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub name: String,
    pub quality: String,
    pub server: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<download_link::Model> for DownloadLinkResponse {
    fn from(m: download_link::Model) -> Self {
        Self {
            id: m.id,
            content_id: m.content_id,
            episode_id: m.episode_id,
            season_number: m.season_number,
            episode_number: m.episode_number,
            name: m.name,
            quality: m.quality,
            server: m.server,
            url: m.url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
