//! Database queries for genres and categories.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};

use crate::entity::{category, genre};
use crate::error::{AppError, AppResult};

use super::DbPool;

fn insert_error(kind: &str, name: &str, e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::InvalidInput(format!("{} '{}' already exists", kind, name))
        }
        _ => AppError::Database(format!("Failed to insert {}: {}", kind.to_lowercase(), e)),
    }
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Whether a category with exactly this name exists; category names are the
/// allowed content type tags.
pub async fn category_name_exists<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<bool> {
    let found = category::Entity::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up category: {}", e)))?;
    Ok(found.is_some())
}

impl DbPool {
    pub async fn list_genres(&self) -> AppResult<Vec<genre::Model>> {
        genre::Entity::find()
            .order_by_asc(genre::Column::Name)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list genres: {}", e)))
    }

    pub async fn list_categories(&self) -> AppResult<Vec<category::Model>> {
        category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list categories: {}", e)))
    }

    pub async fn find_category(&self, id: i32) -> AppResult<Option<category::Model>> {
        category::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get category: {}", e)))
    }

    /// Insert a genre. Duplicate names are rejected as invalid input.
    pub async fn create_genre(&self, name: &str) -> AppResult<genre::Model> {
        let name = clean_name(name)?;
        let now = Utc::now();
        genre::ActiveModel {
            name: Set(name.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| insert_error("Genre", &name, e))
    }

    /// Insert a category. Duplicate names are rejected as invalid input.
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> AppResult<category::Model> {
        let name = clean_name(name)?;
        let now = Utc::now();
        category::ActiveModel {
            name: Set(name.clone()),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| insert_error("Category", &name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Anime ").unwrap(), "Anime");
        assert!(matches!(clean_name("   "), Err(AppError::InvalidInput(_))));
    }
}
