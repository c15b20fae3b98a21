// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_projects_and_sessions::CrawlSessions;

/// 爬取队列项表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QueueItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QueueItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(QueueItems::SessionId).uuid().not_null())
                    .col(ColumnDef::new(QueueItems::Url).text().not_null())
                    .col(ColumnDef::new(QueueItems::Depth).integer().not_null())
                    .col(
                        ColumnDef::new(QueueItems::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(QueueItems::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(QueueItems::DiscoveredFrom).uuid())
                    .col(ColumnDef::new(QueueItems::Seq).big_integer().not_null())
                    .col(
                        ColumnDef::new(QueueItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(QueueItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_queue_items_session")
                            .from(QueueItems::Table, QueueItems::SessionId)
                            .to(CrawlSessions::Table, CrawlSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A URL is enqueued at most once per session
        manager
            .create_index(
                Index::create()
                    .name("uq_queue_items_session_url")
                    .table(QueueItems::Table)
                    .col(QueueItems::SessionId)
                    .col(QueueItems::Url)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QueueItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum QueueItems {
    Table,
    Id,
    SessionId,
    Url,
    Depth,
    Status,
    AttemptCount,
    DiscoveredFrom,
    Seq,
    CreatedAt,
    UpdatedAt,
}
