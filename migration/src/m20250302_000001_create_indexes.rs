// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_projects_and_sessions::CrawlSessions;
use crate::m20250301_000002_create_queue_items::QueueItems;
use crate::m20250301_000003_create_pages_issues_links::{PageLinks, Pages, SeoIssues};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Active-session lookup per project
        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_sessions_project_status")
                    .table(CrawlSessions::Table)
                    .col(CrawlSessions::ProjectId)
                    .col(CrawlSessions::Status)
                    .to_owned(),
            )
            .await?;

        // Claim order: depth first, then insertion order
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_items_session_status_depth_seq")
                    .table(QueueItems::Table)
                    .col(QueueItems::SessionId)
                    .col(QueueItems::Status)
                    .col(QueueItems::Depth)
                    .col(QueueItems::Seq)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pages_session_created_at")
                    .table(Pages::Table)
                    .col(Pages::SessionId)
                    .col(Pages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seo_issues_session_severity")
                    .table(SeoIssues::Table)
                    .col(SeoIssues::SessionId)
                    .col(SeoIssues::Severity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seo_issues_session_category")
                    .table(SeoIssues::Table)
                    .col(SeoIssues::SessionId)
                    .col(SeoIssues::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_seo_issues_page_type")
                    .table(SeoIssues::Table)
                    .col(SeoIssues::PageId)
                    .col(SeoIssues::IssueType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_page_links_from_page")
                    .table(PageLinks::Table)
                    .col(PageLinks::FromPageId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_page_links_from_page",
            "uq_seo_issues_page_type",
            "idx_seo_issues_session_category",
            "idx_seo_issues_session_severity",
            "idx_pages_session_created_at",
            "idx_queue_items_session_status_depth_seq",
            "idx_crawl_sessions_project_status",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
