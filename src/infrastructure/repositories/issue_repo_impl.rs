// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::page_repo_impl::issue_from_model;
use crate::domain::models::issue::Issue;
use crate::domain::repositories::issue_repository::{IssueQuery, IssueRepository};
use crate::domain::repositories::session_repository::RepositoryError;
use crate::infrastructure::database::entities::seo_issue as issue_entity;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 问题仓库实现
pub struct IssueRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl IssueRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IssueRepository for IssueRepositoryImpl {
    async fn list_by_session(
        &self,
        query: &IssueQuery,
    ) -> Result<(Vec<Issue>, u64), RepositoryError> {
        let mut select = issue_entity::Entity::find()
            .filter(issue_entity::Column::SessionId.eq(query.session_id));
        if let Some(severity) = query.severity {
            select = select.filter(issue_entity::Column::Severity.eq(severity.to_string()));
        }
        if let Some(category) = query.category {
            select = select.filter(issue_entity::Column::Category.eq(category.to_string()));
        }

        let total = select.clone().count(self.db.as_ref()).await?;
        let issues = select
            .order_by_desc(issue_entity::Column::ImpactScore)
            .order_by_asc(issue_entity::Column::CreatedAt)
            .order_by_asc(issue_entity::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(issue_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((issues, total))
    }

    async fn list_by_page(&self, page_id: Uuid) -> Result<Vec<Issue>, RepositoryError> {
        issue_entity::Entity::find()
            .filter(issue_entity::Column::PageId.eq(page_id))
            .order_by_desc(issue_entity::Column::ImpactScore)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(issue_from_model)
            .collect()
    }
}
