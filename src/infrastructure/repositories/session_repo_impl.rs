// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::columns::{from_json, parse_column, to_json};
use crate::domain::models::session::{CrawlSession, SessionStatus};
use crate::domain::repositories::session_repository::{RepositoryError, SessionRepository};
use crate::infrastructure::database::entities::crawl_session as session_entity;
use async_trait::async_trait;
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use uuid::Uuid;

/// 会话仓库实现
pub struct SessionRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl SessionRepositoryImpl {
    /// 创建新的会话仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_domain(m: session_entity::Model) -> Result<CrawlSession, RepositoryError> {
        Ok(CrawlSession {
            id: m.id,
            project_id: m.project_id,
            status: parse_column("status", &m.status)?,
            config: from_json(m.config)?,
            started_at: m.started_at.into(),
            completed_at: m.completed_at.map(Into::into),
            error_message: m.error_message,
            crawled_urls: m.crawled_urls,
            failed_urls: m.failed_urls,
            total_urls: m.total_urls,
            updated_at: m.updated_at.into(),
        })
    }
}

#[async_trait]
impl SessionRepository for SessionRepositoryImpl {
    async fn create(&self, session: &CrawlSession) -> Result<CrawlSession, RepositoryError> {
        let model = session_entity::ActiveModel {
            id: Set(session.id),
            project_id: Set(session.project_id),
            status: Set(session.status.to_string()),
            config: Set(to_json(&session.config)?),
            started_at: Set(session.started_at.into()),
            completed_at: Set(session.completed_at.map(Into::into)),
            error_message: Set(session.error_message.clone()),
            crawled_urls: Set(session.crawled_urls),
            failed_urls: Set(session.failed_urls),
            total_urls: Set(session.total_urls),
            updated_at: Set(session.updated_at.into()),
        };

        model.insert(self.db.as_ref()).await?;
        Ok(session.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlSession>, RepositoryError> {
        session_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Self::to_domain)
            .transpose()
    }

    async fn update(&self, session: &CrawlSession) -> Result<(), RepositoryError> {
        let result = session_entity::Entity::update_many()
            .col_expr(
                session_entity::Column::Status,
                Expr::value(session.status.to_string()),
            )
            .col_expr(
                session_entity::Column::CompletedAt,
                Expr::value(session.completed_at.map(chrono::DateTime::<chrono::FixedOffset>::from)),
            )
            .col_expr(
                session_entity::Column::ErrorMessage,
                Expr::value(session.error_message.clone()),
            )
            .col_expr(
                session_entity::Column::CrawledUrls,
                Expr::value(session.crawled_urls),
            )
            .col_expr(
                session_entity::Column::FailedUrls,
                Expr::value(session.failed_urls),
            )
            .col_expr(
                session_entity::Column::TotalUrls,
                Expr::value(session.total_urls),
            )
            .col_expr(
                session_entity::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(session.updated_at)),
            )
            .filter(session_entity::Column::Id.eq(session.id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_active_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<CrawlSession>, RepositoryError> {
        session_entity::Entity::find()
            .filter(session_entity::Column::ProjectId.eq(project_id))
            .filter(session_entity::Column::Status.is_in([
                SessionStatus::Pending.to_string(),
                SessionStatus::Running.to_string(),
            ]))
            .order_by_desc(session_entity::Column::StartedAt)
            .one(self.db.as_ref())
            .await?
            .map(Self::to_domain)
            .transpose()
    }
}
