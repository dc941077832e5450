//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VOD Media Server",
        version = "0.1.0",
        description = "Video-on-demand catalog with upload intake, HLS transcoding and range streaming"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        api::health::health,
        api::health::ready,
        api::contents::list_contents,
        api::contents::search_contents,
        api::contents::contents_by_genre,
        api::contents::contents_by_category,
        api::contents::get_content,
        api::contents::create_content,
        api::contents::update_content,
        api::contents::delete_content,
        api::episodes::list_episodes,
        api::episodes::next_episode,
        api::episodes::latest_episode,
        api::episodes::get_episode,
        api::episodes::create_episode,
        api::episodes::update_episode,
        api::episodes::delete_episode,
        api::media::upload_content_video,
        api::media::upload_episode_video,
        api::media::upload_cover,
        api::media::upload_thumbnail,
        api::media::stream_content,
        api::media::stream_episode,
        api::media::content_hls,
        api::media::episode_hls,
        api::media::get_job,
        api::taxonomy::list_genres,
        api::taxonomy::create_genre,
        api::taxonomy::list_categories,
        api::taxonomy::create_category,
        api::session::current_session,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            models::ContentResponse,
            models::ContentListResponse,
            models::ContentMutationResponse,
            models::EpisodeResponse,
            models::EpisodeRequest,
            models::StreamLinkResponse,
            models::DownloadLinkResponse,
            models::LinkKind,
            models::GenreResponse,
            models::CategoryResponse,
            models::CreateTaxonomyRequest,
            models::UploadResponse,
            models::TranscodeJobResponse,
            models::JobStatus,
            models::MessageResponse,
            api::session::SessionResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Contents", description = "Catalog browsing and admin upsert"),
        (name = "Episodes", description = "Episodes of a content"),
        (name = "Media", description = "Uploads, streaming and transcoding status"),
        (name = "Taxonomy", description = "Genres and categories"),
        (name = "Auth", description = "Token identity")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
