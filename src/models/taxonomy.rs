//! Genre and category DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{category, genre};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenreResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<genre::Model> for GenreResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

/// Body for creating a genre or category.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaxonomyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
