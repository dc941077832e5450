//! Migration: Create transcode_jobs table.
//!
//! Rows outlive the process so unfinished jobs can be resumed on boot.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE transcode_jobs (
                    id SERIAL PRIMARY KEY,
                    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
                    episode_id INTEGER REFERENCES episodes(id) ON DELETE SET NULL,
                    -- original file, relative to the media root
                    source_path VARCHAR(500) NOT NULL,
                    status VARCHAR(20) NOT NULL DEFAULT 'queued'
                        CHECK (status IN ('queued', 'running', 'completed', 'failed')),
                    -- ladder label being encoded, or the one that failed
                    current_rung VARCHAR(10),
                    error_message TEXT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Boot-time resume scans unfinished jobs only
                CREATE INDEX idx_transcode_jobs_unfinished ON transcode_jobs(id)
                    WHERE status IN ('queued', 'running');

                CREATE TRIGGER update_transcode_jobs_updated_at
                    BEFORE UPDATE ON transcode_jobs
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_transcode_jobs_updated_at ON transcode_jobs;
                DROP TABLE IF EXISTS transcode_jobs CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
