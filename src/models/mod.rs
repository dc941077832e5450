//! Domain models and DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub mod content;
pub mod episode;
pub mod job;
pub mod link;
pub mod taxonomy;

pub use content::{
    ContentForm, ContentListResponse, ContentMutationResponse, ContentResponse,
    ContentWithRelations, DownloadLinkInput, EpisodeInput, IncludeQuery, ListContentsQuery,
    Relations, SearchQuery, StreamLinkInput,
};
pub use episode::{EpisodeListQuery, EpisodeRequest, EpisodeResponse};
pub use job::{JobStatus, TranscodeJob, TranscodeJobResponse, UploadResponse};
pub use link::{DownloadLinkResponse, LinkKind, StreamLinkResponse};
pub use taxonomy::{CategoryResponse, CreateTaxonomyRequest, GenreResponse};

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination parameters.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }
}

/// Plain `{ "message": ... }` body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
