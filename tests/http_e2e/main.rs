//! HTTP E2E test suite that needs no database.
//!
//! Covers byte-range streaming, media file serving and token authorization
//! against an in-process actix service backed by a temporary media root.
//!
//! Run with: cargo test --test http_e2e

mod test_auth;
mod test_helpers;
mod test_media_files;
mod test_streaming;
