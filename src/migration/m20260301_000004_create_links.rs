//! Migration: Create stream_links and download_links tables.
//!
//! Links hang off a content and optionally an episode of that content.

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
                CREATE TABLE stream_links (
                    id SERIAL PRIMARY KEY,
                    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
                    episode_id INTEGER REFERENCES episodes(id) ON DELETE CASCADE,
                    season_number INTEGER,
                    episode_number INTEGER,
                    name VARCHAR(100) NOT NULL,
                    quality VARCHAR(20) NOT NULL DEFAULT '',
                    kind VARCHAR(20) NOT NULL DEFAULT 'embed'
                        CHECK (kind IN ('embed', 'self-hosted')),
                    -- embed provider tag, NULL when unrecognised
                    provider VARCHAR(50),
                    server VARCHAR(100) NOT NULL DEFAULT 'local',
                    -- raw URL for embeds, media-relative path for self-hosted
                    url TEXT NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_stream_links_content_id ON stream_links(content_id);
                CREATE INDEX idx_stream_links_episode_id ON stream_links(episode_id);

                CREATE TABLE download_links (
                    id SERIAL PRIMARY KEY,
                    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
                    episode_id INTEGER REFERENCES episodes(id) ON DELETE CASCADE,
                    season_number INTEGER,
                    episode_number INTEGER,
                    name VARCHAR(100) NOT NULL,
                    quality VARCHAR(20) NOT NULL DEFAULT '',
                    server VARCHAR(100) NOT NULL DEFAULT 'external',
                    url TEXT NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_download_links_content_id ON download_links(content_id);
                CREATE INDEX idx_download_links_episode_id ON download_links(episode_id);

                CREATE TRIGGER update_stream_links_updated_at
                    BEFORE UPDATE ON stream_links
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();

                CREATE TRIGGER update_download_links_updated_at
                    BEFORE UPDATE ON download_links
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
                DROP TABLE IF EXISTS download_links CASCADE;
                DROP TABLE IF EXISTS stream_links CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
