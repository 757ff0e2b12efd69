//! link_hits 表迁移
//!
//! 只追加的访问记录，每次成功解析 slug 写入一行。

use sea_orm_migration::prelude::*;

use crate::m20261016_000001_tracked_links::TrackedLinks;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LinkHits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkHits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LinkHits::LinkId).big_integer().not_null())
                    .col(
                        ColumnDef::new(LinkHits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // 45 字符足以容纳任意 IPv6 文本形式（含 IPv4 映射地址）
                    .col(
                        ColumnDef::new(LinkHits::RemoteAddress)
                            .string_len(45)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_link_hits_link_id")
                            .from(LinkHits::Table, LinkHits::LinkId)
                            .to(TrackedLinks::Table, TrackedLinks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_link_hits_link_id")
                    .table(LinkHits::Table)
                    .col(LinkHits::LinkId)
                    .to_owned(),
            )
            .await?;

        // 时间范围查询（activity_over_time）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_link_hits_created_at")
                    .table(LinkHits::Table)
                    .col(LinkHits::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_link_hits_link_time")
                    .table(LinkHits::Table)
                    .col(LinkHits::LinkId)
                    .col(LinkHits::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_link_hits_link_time").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_link_hits_created_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_link_hits_link_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LinkHits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LinkHits {
    #[sea_orm(iden = "link_hits")]
    Table,
    Id,
    LinkId,
    CreatedAt,
    RemoteAddress,
}
