//! Migration: Create contents and the content/genre join table.

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
                CREATE TABLE contents (
                    id SERIAL PRIMARY KEY,
                    title VARCHAR(255) NOT NULL,
                    description TEXT,
                    -- must match a categories.name, checked by the application
                    content_type VARCHAR(100) NOT NULL,
                    -- relative to the media root
                    cover_image VARCHAR(500),
                    release_date DATE,
                    -- minutes
                    duration INTEGER,
                    rating REAL NOT NULL DEFAULT 0,
                    season_id INTEGER REFERENCES seasons(id) ON DELETE SET NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- Upsert-on-title: one live row per title
                CREATE UNIQUE INDEX idx_contents_title_active ON contents(title)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_contents_content_type ON contents(content_type)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_contents_created_at ON contents(created_at DESC)
                    WHERE deleted_at IS NULL;

                CREATE TABLE content_genres (
                    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
                    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
                    PRIMARY KEY (content_id, genre_id)
                );

                CREATE INDEX idx_content_genres_genre_id ON content_genres(genre_id);

                CREATE TRIGGER update_contents_updated_at
                    BEFORE UPDATE ON contents
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
                DROP TABLE IF EXISTS content_genres CASCADE;
                DROP TRIGGER IF EXISTS update_contents_updated_at ON contents;
                DROP TABLE IF EXISTS contents CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
