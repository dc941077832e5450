//! SeaORM entity definitions for PostgreSQL database.

pub mod category;
pub mod content;
pub mod content_genre;
pub mod download_link;
pub mod episode;
pub mod genre;
pub mod season;
pub mod stream_link;
pub mod transcode_job;
