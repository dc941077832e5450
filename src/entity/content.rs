//! Content entity: a movie, series or anime in the catalog.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub content_type: String,
    pub cover_image: Option<String>,
    pub release_date: Option<Date>,
    pub duration: Option<i32>,
    pub rating: f32,
    pub season_id: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episode::Entity")]
    Episodes,
    #[sea_orm(has_many = "super::stream_link::Entity")]
    StreamLinks,
    #[sea_orm(has_many = "super::download_link::Entity")]
    DownloadLinks,
    #[sea_orm(has_many = "super::content_genre::Entity")]
    ContentGenres,
    #[sea_orm(
        belongs_to = "super::season::Entity",
        from = "Column::SeasonId",
        to = "super::season::Column::Id",
        on_delete = "SetNull"
    )]
    Season,
}

impl Related<super::episode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl Related<super::stream_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StreamLinks.def()
    }
}

impl Related<super::download_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DownloadLinks.def()
    }
}

impl Related<super::content_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentGenres.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::content_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::content_genre::Relation::Content.def().rev())
    }
}

impl Related<super::season::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Season.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
