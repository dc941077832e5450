//! VOD media server library.
//!
//! Catalog storage, upload intake, background HLS transcoding and
//! range-aware streaming behind an Actix-web API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
