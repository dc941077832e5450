//! Migration: Create episodes table.

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
                CREATE TABLE episodes (
                    id SERIAL PRIMARY KEY,
                    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
                    title VARCHAR(255) NOT NULL,
                    description TEXT,
                    episode_number INTEGER NOT NULL CHECK (episode_number >= 1),
                    season_number INTEGER NOT NULL DEFAULT 1 CHECK (season_number >= 1),
                    -- relative to the media root, empty until a video is uploaded
                    video_path VARCHAR(500) NOT NULL DEFAULT '',
                    -- seconds
                    duration INTEGER NOT NULL DEFAULT 0,
                    thumbnail_url VARCHAR(500),
                    release_date DATE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE UNIQUE INDEX idx_episodes_coordinates_active
                    ON episodes(content_id, season_number, episode_number)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_episodes_updated_at
                    BEFORE UPDATE ON episodes
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
                DROP TRIGGER IF EXISTS update_episodes_updated_at ON episodes;
                DROP TABLE IF EXISTS episodes CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
