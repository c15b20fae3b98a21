// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::columns::parse_column;
use crate::domain::models::summary::{IssueFacts, PageFacts, SessionSnapshot};
use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::repositories::session_repository::RepositoryError;
use crate::infrastructure::database::entities::{page as page_entity, seo_issue as issue_entity};
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 统计仓库实现
///
/// 页面与问题在同一个只读事务中读取。PostgreSQL 下使用 REPEATABLE READ，
/// 两次查询看到同一快照；SQLite 的事务本身已是串行化的。
pub struct AnalyticsRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn begin_snapshot(&self) -> Result<DatabaseTransaction, DbErr> {
        match self.db.get_database_backend() {
            DbBackend::Postgres => {
                self.db
                    .begin_with_config(
                        Some(IsolationLevel::RepeatableRead),
                        Some(AccessMode::ReadOnly),
                    )
                    .await
            }
            _ => self.db.begin().await,
        }
    }
}

#[async_trait]
impl AnalyticsRepository for AnalyticsRepositoryImpl {
    async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, RepositoryError> {
        let txn = self.begin_snapshot().await?;

        let pages = page_entity::Entity::find()
            .select_only()
            .column(page_entity::Column::Id)
            .column(page_entity::Column::StatusCode)
            .column(page_entity::Column::LoadTime)
            .column(page_entity::Column::WordCount)
            .filter(page_entity::Column::SessionId.eq(session_id))
            .into_tuple::<(Uuid, Option<i32>, f64, Option<i32>)>()
            .all(&txn)
            .await?
            .into_iter()
            .map(|(page_id, status_code, load_time, word_count)| PageFacts {
                page_id,
                status_code,
                load_time,
                word_count,
            })
            .collect();

        let issues = issue_entity::Entity::find()
            .select_only()
            .column(issue_entity::Column::PageId)
            .column(issue_entity::Column::Severity)
            .column(issue_entity::Column::Category)
            .filter(issue_entity::Column::SessionId.eq(session_id))
            .into_tuple::<(Uuid, String, String)>()
            .all(&txn)
            .await?
            .into_iter()
            .map(|(page_id, severity, category)| {
                Ok(IssueFacts {
                    page_id,
                    severity: parse_column("severity", &severity)?,
                    category: parse_column("category", &category)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        txn.commit().await?;
        Ok(SessionSnapshot { pages, issues })
    }
}
