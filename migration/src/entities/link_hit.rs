//! Link hit entity, one row per served slug

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "link_hits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub link_id: i64,
    pub created_at: DateTimeUtc,
    pub remote_address: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tracked_link::Entity",
        from = "Column::LinkId",
        to = "super::tracked_link::Column::Id",
        on_delete = "Cascade"
    )]
    TrackedLink,
}

impl Related<super::tracked_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackedLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
