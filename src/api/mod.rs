//! API endpoint modules.

pub mod contents;
pub mod episodes;
pub mod files;
pub mod health;
pub mod media;
pub mod openapi;
pub mod session;
pub mod taxonomy;

pub use contents::configure_routes as configure_content_routes;
pub use episodes::configure_routes as configure_episode_routes;
pub use files::configure_routes as configure_file_routes;
pub use health::configure_health_routes;
pub use media::configure_routes as configure_media_routes;
pub use openapi::ApiDoc;
pub use session::configure_routes as configure_session_routes;
pub use taxonomy::configure_routes as configure_taxonomy_routes;

use actix_web::web;

/// Everything mounted under `/api`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_content_routes)
        .configure(configure_episode_routes)
        .configure(configure_media_routes)
        .configure(configure_taxonomy_routes)
        .configure(configure_session_routes);
}
