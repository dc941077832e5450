//! Catalog E2E test suite.
//!
//! Exercises the admin upsert form, upload limits and the stream resolver
//! against a real database. Requires PostgreSQL reachable through
//! `DATABASE_URL` (or the `DB_*` variables), so every test is ignored by default.
//!
//! Run with: cargo test --test catalog_e2e -- --ignored

mod test_helpers;

mod test_episode_edits;
mod test_resolver;
mod test_upload_limits;
mod test_upsert;
