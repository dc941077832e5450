//! Genre entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "genres")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_genre::Entity")]
    ContentGenres,
}

impl Related<super::content_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentGenres.def()
    }
}

impl Related<super::content::Entity> for Entity {
    fn to() -> RelationDef {
        super::content_genre::Relation::Content.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::content_genre::Relation::Genre.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
