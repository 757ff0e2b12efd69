//! tracked_links 表迁移
//!
//! 每行对应一个可追踪链接：
//! - slug（全局唯一，公开查找键）
//! - 链接类型与目标地址
//! - 来源 (source_type, source_id) 与观察者 (observer_type, observer_id)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrackedLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrackedLinks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrackedLinks::Slug).string_len(64).not_null())
                    .col(
                        ColumnDef::new(TrackedLinks::LinkType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackedLinks::Destination).text().not_null())
                    .col(
                        ColumnDef::new(TrackedLinks::SourceType)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackedLinks::SourceId).big_integer().null())
                    .col(
                        ColumnDef::new(TrackedLinks::ObserverType)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(TrackedLinks::ObserverId).big_integer().null())
                    .col(
                        ColumnDef::new(TrackedLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // slug 唯一索引：并发创建时由数据库保证唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracked_links_slug")
                    .table(TrackedLinks::Table)
                    .col(TrackedLinks::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 观察者复合索引（analytics 全部按 observer 过滤）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tracked_links_observer")
                    .table(TrackedLinks::Table)
                    .col(TrackedLinks::ObserverType)
                    .col(TrackedLinks::ObserverId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tracked_links_observer").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_tracked_links_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TrackedLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum TrackedLinks {
    #[sea_orm(iden = "tracked_links")]
    Table,
    Id,
    Slug,
    LinkType,
    Destination,
    SourceType,
    SourceId,
    ObserverType,
    ObserverId,
    CreatedAt,
}
