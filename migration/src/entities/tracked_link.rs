//! Tracked link entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tracked_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub slug: String,
    /// "Redirect" | "DirectDownload"
    pub link_type: String,
    #[sea_orm(column_type = "Text")]
    pub destination: String,
    /// Label text or referenced entity type
    pub source_type: String,
    /// NULL for label sources
    pub source_id: Option<i64>,
    pub observer_type: Option<String>,
    pub observer_id: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::link_hit::Entity")]
    LinkHit,
}

impl Related<super::link_hit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkHit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
