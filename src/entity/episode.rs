//! Episode entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "episodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub content_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    /// Relative to the media root; empty until a video is uploaded.
    pub video_path: String,
    /// Seconds.
    pub duration: i32,
    pub thumbnail_url: Option<String>,
    pub release_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::content::Entity",
        from = "Column::ContentId",
        to = "super::content::Column::Id",
        on_delete = "Cascade"
    )]
    Content,
    #[sea_orm(has_many = "super::stream_link::Entity")]
    StreamLinks,
    #[sea_orm(has_many = "super::download_link::Entity")]
    DownloadLinks,
}

impl Related<super::content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
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

impl ActiveModelBehavior for ActiveModel {}
