// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_projects_and_sessions::CrawlSessions;

/// 页面、SEO问题与页面链接表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Pages (append-only per session)
        manager
            .create_table(
                Table::create()
                    .table(Pages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pages::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Pages::SessionId).uuid().not_null())
                    .col(ColumnDef::new(Pages::QueueItemId).uuid().not_null())
                    .col(ColumnDef::new(Pages::Url).text().not_null())
                    .col(ColumnDef::new(Pages::Title).text())
                    .col(ColumnDef::new(Pages::StatusCode).integer())
                    .col(ColumnDef::new(Pages::LoadTime).double().not_null())
                    .col(ColumnDef::new(Pages::WordCount).integer())
                    .col(ColumnDef::new(Pages::Depth).integer().not_null())
                    .col(ColumnDef::new(Pages::Meta).json().not_null())
                    .col(
                        ColumnDef::new(Pages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pages_session")
                            .from(Pages::Table, Pages::SessionId)
                            .to(CrawlSessions::Table, CrawlSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. SEO issues (depends on pages)
        manager
            .create_table(
                Table::create()
                    .table(SeoIssues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SeoIssues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SeoIssues::PageId).uuid().not_null())
                    .col(ColumnDef::new(SeoIssues::SessionId).uuid().not_null())
                    .col(ColumnDef::new(SeoIssues::IssueType).string_len(100).not_null())
                    .col(ColumnDef::new(SeoIssues::Severity).string_len(20).not_null())
                    .col(ColumnDef::new(SeoIssues::Category).string_len(20).not_null())
                    .col(ColumnDef::new(SeoIssues::Description).text().not_null())
                    .col(ColumnDef::new(SeoIssues::Recommendation).text())
                    .col(
                        ColumnDef::new(SeoIssues::ImpactScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SeoIssues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seo_issues_page")
                            .from(SeoIssues::Table, SeoIssues::PageId)
                            .to(Pages::Table, Pages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 3. Page links (directed edges, depends on pages)
        manager
            .create_table(
                Table::create()
                    .table(PageLinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PageLinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PageLinks::SessionId).uuid().not_null())
                    .col(ColumnDef::new(PageLinks::FromPageId).uuid().not_null())
                    .col(ColumnDef::new(PageLinks::ToUrl).text().not_null())
                    .col(ColumnDef::new(PageLinks::LinkType).string_len(10).not_null())
                    .col(
                        ColumnDef::new(PageLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_page_links_page")
                            .from(PageLinks::Table, PageLinks::FromPageId)
                            .to(Pages::Table, Pages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PageLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SeoIssues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Pages {
    Table,
    Id,
    SessionId,
    QueueItemId,
    Url,
    Title,
    StatusCode,
    LoadTime,
    WordCount,
    Depth,
    Meta,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum SeoIssues {
    Table,
    Id,
    PageId,
    SessionId,
    IssueType,
    Severity,
    Category,
    Description,
    Recommendation,
    ImpactScore,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum PageLinks {
    Table,
    Id,
    SessionId,
    FromPageId,
    ToUrl,
    LinkType,
    CreatedAt,
}
