//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_taxonomy;
mod m20260301_000002_create_contents;
mod m20260301_000003_create_episodes;
mod m20260301_000004_create_links;
mod m20260301_000005_create_transcode_jobs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_taxonomy::Migration),
            Box::new(m20260301_000002_create_contents::Migration),
            Box::new(m20260301_000003_create_episodes::Migration),
            Box::new(m20260301_000004_create_links::Migration),
            Box::new(m20260301_000005_create_transcode_jobs::Migration),
        ]
    }
}
