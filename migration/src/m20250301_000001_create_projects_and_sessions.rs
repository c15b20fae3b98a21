// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 项目与爬取会话表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Projects are owned by an external collaborator, the core only reads them
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Projects::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Projects::Domain).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. Crawl sessions (depends on projects)
        manager
            .create_table(
                Table::create()
                    .table(CrawlSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlSessions::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(CrawlSessions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(CrawlSessions::Config).json().not_null())
                    .col(
                        ColumnDef::new(CrawlSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CrawlSessions::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CrawlSessions::ErrorMessage).text())
                    .col(
                        ColumnDef::new(CrawlSessions::CrawledUrls)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CrawlSessions::FailedUrls)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CrawlSessions::TotalUrls).integer())
                    .col(
                        ColumnDef::new(CrawlSessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crawl_sessions_project")
                            .from(CrawlSessions::Table, CrawlSessions::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrawlSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Projects {
    Table,
    Id,
    Name,
    Domain,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum CrawlSessions {
    Table,
    Id,
    ProjectId,
    Status,
    Config,
    StartedAt,
    CompletedAt,
    ErrorMessage,
    CrawledUrls,
    FailedUrls,
    TotalUrls,
    UpdatedAt,
}
