//! Database queries for contents and their eager-loaded relations.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entity::content::{self, ActiveModel, Entity as Content};
use crate::entity::{category, content_genre, download_link, episode, genre, stream_link};
use crate::error::{AppError, AppResult};
use crate::models::{ContentForm, ContentWithRelations, PaginationParams, Relations};

use super::DbPool;

/// Listing filters; all set fields must match.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub content_type: Option<String>,
    pub genre_id: Option<i32>,
    /// Matches contents whose type tag equals this category's name.
    pub category_id: Option<i32>,
    /// Case-insensitive title substring.
    pub title_query: Option<String>,
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Active (not soft-deleted) content by id.
pub async fn find_active<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Option<content::Model>> {
    Content::find_by_id(id)
        .filter(content::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get content: {}", e)))
}

/// Active content with exactly this title.
pub async fn find_active_by_title<C: ConnectionTrait>(
    db: &C,
    title: &str,
) -> AppResult<Option<content::Model>> {
    Content::find()
        .filter(content::Column::Title.eq(title))
        .filter(content::Column::DeletedAt.is_null())
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find content by title: {}", e)))
}

/// Insert a content row from a form that carries at least a title and a type.
pub async fn insert_content<C: ConnectionTrait>(
    db: &C,
    form: &ContentForm,
) -> AppResult<content::Model> {
    let title = form
        .title
        .clone()
        .ok_or_else(|| AppError::InvalidInput("Title is required".to_string()))?;
    let content_type = form
        .content_type
        .clone()
        .ok_or_else(|| AppError::InvalidInput("Content type is required".to_string()))?;
    let now = Utc::now();

    let model = ActiveModel {
        title: Set(title),
        description: Set(form.description.clone()),
        content_type: Set(content_type),
        cover_image: Set(None),
        release_date: Set(form.release_date),
        duration: Set(form.duration),
        rating: Set(form.rating.unwrap_or(0.0)),
        season_id: Set(form.season_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };

    model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert content: {}", e)))
}

/// Apply the submitted fields of `form` to an existing row.
pub async fn update_content<C: ConnectionTrait>(
    db: &C,
    existing: content::Model,
    form: &ContentForm,
) -> AppResult<content::Model> {
    let mut active: ActiveModel = existing.into();
    if let Some(ref title) = form.title {
        active.title = Set(title.clone());
    }
    if form.description.is_some() {
        active.description = Set(form.description.clone());
    }
    if let Some(ref content_type) = form.content_type {
        active.content_type = Set(content_type.clone());
    }
    if form.release_date.is_some() {
        active.release_date = Set(form.release_date);
    }
    if let Some(rating) = form.rating {
        active.rating = Set(rating);
    }
    if form.duration.is_some() {
        active.duration = Set(form.duration);
    }
    if form.season_id.is_some() {
        active.season_id = Set(form.season_id);
    }
    active.updated_at = Set(Utc::now());

    active
        .update(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update content: {}", e)))
}

/// Point the content's cover at `path`.
pub async fn set_cover_image<C: ConnectionTrait>(
    db: &C,
    content: content::Model,
    path: &str,
) -> AppResult<content::Model> {
    let mut active: ActiveModel = content.into();
    active.cover_image = Set(Some(path.to_string()));
    active.updated_at = Set(Utc::now());
    active
        .update(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update cover image: {}", e)))
}

/// Replace the genre set of a content. Unknown genre ids are rejected.
pub async fn replace_genres<C: ConnectionTrait>(
    db: &C,
    content_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    let unique: Vec<i32> = genre_ids
        .iter()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if !unique.is_empty() {
        let known = genre::Entity::find()
            .filter(genre::Column::Id.is_in(unique.clone()))
            .count(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to check genres: {}", e)))?;
        if known != unique.len() as u64 {
            return Err(AppError::InvalidInput(format!(
                "Unknown genre id in {:?}",
                genre_ids
            )));
        }
    }

    content_genre::Entity::delete_many()
        .filter(content_genre::Column::ContentId.eq(content_id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear genres: {}", e)))?;

    if unique.is_empty() {
        return Ok(());
    }

    let rows = unique.into_iter().map(|genre_id| content_genre::ActiveModel {
        content_id: Set(content_id),
        genre_id: Set(genre_id),
    });
    content_genre::Entity::insert_many(rows)
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to attach genres: {}", e)))?;

    Ok(())
}

/// Load the requested relations for a batch of contents, preserving order.
pub async fn load_relations<C: ConnectionTrait>(
    db: &C,
    contents: Vec<content::Model>,
    relations: Relations,
) -> AppResult<Vec<ContentWithRelations>> {
    if contents.is_empty() || relations == Relations::NONE {
        return Ok(contents.into_iter().map(ContentWithRelations::bare).collect());
    }

    let ids: Vec<i32> = contents.iter().map(|c| c.id).collect();

    let mut episodes: HashMap<i32, Vec<episode::Model>> = HashMap::new();
    if relations.episodes {
        let rows = episode::Entity::find()
            .filter(episode::Column::ContentId.is_in(ids.clone()))
            .filter(episode::Column::DeletedAt.is_null())
            .order_by_asc(episode::Column::SeasonNumber)
            .order_by_asc(episode::Column::EpisodeNumber)
            .all(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load episodes: {}", e)))?;
        for row in rows {
            episodes.entry(row.content_id).or_default().push(row);
        }
    }

    let mut genres: HashMap<i32, Vec<genre::Model>> = HashMap::new();
    if relations.genres {
        let rows = content_genre::Entity::find()
            .filter(content_genre::Column::ContentId.is_in(ids.clone()))
            .find_also_related(genre::Entity)
            .order_by_asc(content_genre::Column::GenreId)
            .all(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load genres: {}", e)))?;
        for (link, genre) in rows {
            if let Some(genre) = genre {
                genres.entry(link.content_id).or_default().push(genre);
            }
        }
    }

    let mut categories: HashMap<String, Vec<category::Model>> = HashMap::new();
    if relations.categories {
        let names: Vec<String> = contents
            .iter()
            .map(|c| c.content_type.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let rows = category::Entity::find()
            .filter(category::Column::Name.is_in(names))
            .all(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load categories: {}", e)))?;
        for row in rows {
            categories.entry(row.name.clone()).or_default().push(row);
        }
    }

    let mut streams: HashMap<i32, Vec<stream_link::Model>> = HashMap::new();
    if relations.stream_links {
        let rows = stream_link::Entity::find()
            .filter(stream_link::Column::ContentId.is_in(ids.clone()))
            .order_by_asc(stream_link::Column::Id)
            .all(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load stream links: {}", e)))?;
        for row in rows {
            streams.entry(row.content_id).or_default().push(row);
        }
    }

    let mut downloads: HashMap<i32, Vec<download_link::Model>> = HashMap::new();
    if relations.download_links {
        let rows = download_link::Entity::find()
            .filter(download_link::Column::ContentId.is_in(ids))
            .order_by_asc(download_link::Column::Id)
            .all(db)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load download links: {}", e)))?;
        for row in rows {
            downloads.entry(row.content_id).or_default().push(row);
        }
    }

    Ok(contents
        .into_iter()
        .map(|content| {
            let id = content.id;
            let categories = categories
                .get(&content.content_type)
                .cloned()
                .unwrap_or_default();
            ContentWithRelations {
                episodes: episodes.remove(&id).unwrap_or_default(),
                genres: genres.remove(&id).unwrap_or_default(),
                categories,
                stream_links: streams.remove(&id).unwrap_or_default(),
                download_links: downloads.remove(&id).unwrap_or_default(),
                content,
            }
        })
        .collect())
}

impl DbPool {
    /// Get an active content with the requested relations.
    pub async fn get_content(
        &self,
        id: i32,
        relations: Relations,
    ) -> AppResult<Option<ContentWithRelations>> {
        let Some(content) = find_active(self.connection(), id).await? else {
            return Ok(None);
        };
        let mut loaded = load_relations(self.connection(), vec![content], relations).await?;
        Ok(loaded.pop())
    }

    /// Whether an active content with this id exists.
    pub async fn content_exists(&self, id: i32) -> AppResult<bool> {
        Ok(find_active(self.connection(), id).await?.is_some())
    }

    /// List active contents, newest first. Returns the page and the total match count.
    pub async fn list_contents(
        &self,
        filter: &ContentFilter,
        pagination: &PaginationParams,
        relations: Relations,
    ) -> AppResult<(Vec<ContentWithRelations>, u64)> {
        let mut select = Content::find().filter(content::Column::DeletedAt.is_null());

        if let Some(ref content_type) = filter.content_type {
            select = select.filter(content::Column::ContentType.eq(content_type.as_str()));
        }

        if let Some(genre_id) = filter.genre_id {
            select = select.filter(
                content::Column::Id.in_subquery(
                    Query::select()
                        .column(content_genre::Column::ContentId)
                        .from(content_genre::Entity)
                        .and_where(content_genre::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }

        if let Some(category_id) = filter.category_id {
            let category = self
                .find_category(category_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Category {}", category_id)))?;
            select = select.filter(content::Column::ContentType.eq(category.name));
        }

        if let Some(ref term) = filter.title_query {
            let pattern = format!("%{}%", escape_like(term.trim()));
            select = select.filter(Expr::col((Content, content::Column::Title)).ilike(&pattern));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count contents: {}", e)))?;

        let contents = select
            .order_by_desc(content::Column::CreatedAt)
            .order_by_desc(content::Column::Id)
            .offset(pagination.offset())
            .limit(u64::from(pagination.page_size()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list contents: {}", e)))?;

        let loaded = load_relations(self.connection(), contents, relations).await?;
        Ok((loaded, total))
    }

    /// Store a new cover path on an active content.
    pub async fn update_content_cover(&self, id: i32, path: &str) -> AppResult<content::Model> {
        let content = find_active(self.connection(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content {}", id)))?;
        set_cover_image(self.connection(), content, path).await
    }

    /// Soft-delete a content and its episodes, and drop its links.
    pub async fn soft_delete_content(&self, id: i32) -> AppResult<()> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let content = find_active(&txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content {}", id)))?;

        super::episodes::purge_content_episodes(&txn, id).await?;

        let mut active: ActiveModel = content.into();
        active.deleted_at = Set(Some(Utc::now()));
        active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete content: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit delete: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("show"), "show");
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }
}
