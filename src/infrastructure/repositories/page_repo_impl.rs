// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::columns::{from_json, parse_column, to_json};
use crate::domain::models::issue::Issue;
use crate::domain::models::page::Page;
use crate::domain::models::page_link::PageLink;
use crate::domain::repositories::page_repository::{PageAnalysis, PageRepository};
use crate::domain::repositories::session_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    page as page_entity, page_link as link_entity, seo_issue as issue_entity,
};
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 页面仓库实现
///
/// 页面、问题与链接在同一事务中写入。
pub struct PageRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PageRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

pub(crate) fn page_from_model(m: page_entity::Model) -> Result<Page, RepositoryError> {
    Ok(Page {
        id: m.id,
        session_id: m.session_id,
        queue_item_id: m.queue_item_id,
        url: m.url,
        title: m.title,
        status_code: m.status_code,
        load_time: m.load_time,
        word_count: m.word_count,
        depth: m.depth,
        meta: from_json(m.meta)?,
        created_at: m.created_at.into(),
    })
}

pub(crate) fn issue_from_model(m: issue_entity::Model) -> Result<Issue, RepositoryError> {
    Ok(Issue {
        id: m.id,
        page_id: m.page_id,
        session_id: m.session_id,
        issue_type: m.issue_type,
        severity: parse_column("severity", &m.severity)?,
        category: parse_column("category", &m.category)?,
        description: m.description,
        recommendation: m.recommendation,
        impact_score: m.impact_score,
        created_at: m.created_at.into(),
    })
}

fn link_from_model(m: link_entity::Model) -> Result<PageLink, RepositoryError> {
    Ok(PageLink {
        id: m.id,
        session_id: m.session_id,
        from_page_id: m.from_page_id,
        to_url: m.to_url,
        link_type: parse_column("link_type", &m.link_type)?,
        created_at: m.created_at.into(),
    })
}

fn issue_to_active(issue: &Issue) -> issue_entity::ActiveModel {
    issue_entity::ActiveModel {
        id: Set(issue.id),
        page_id: Set(issue.page_id),
        session_id: Set(issue.session_id),
        issue_type: Set(issue.issue_type.clone()),
        severity: Set(issue.severity.to_string()),
        category: Set(issue.category.to_string()),
        description: Set(issue.description.clone()),
        recommendation: Set(issue.recommendation.clone()),
        impact_score: Set(issue.impact_score),
        created_at: Set(issue.created_at.into()),
    }
}

fn link_to_active(link: &PageLink) -> link_entity::ActiveModel {
    link_entity::ActiveModel {
        id: Set(link.id),
        session_id: Set(link.session_id),
        from_page_id: Set(link.from_page_id),
        to_url: Set(link.to_url.clone()),
        link_type: Set(link.link_type.to_string()),
        created_at: Set(link.created_at.into()),
    }
}

#[async_trait]
impl PageRepository for PageRepositoryImpl {
    async fn save_analysis(&self, analysis: &PageAnalysis) -> Result<(), RepositoryError> {
        let page = &analysis.page;
        let page_model = page_entity::ActiveModel {
            id: Set(page.id),
            session_id: Set(page.session_id),
            queue_item_id: Set(page.queue_item_id),
            url: Set(page.url.clone()),
            title: Set(page.title.clone()),
            status_code: Set(page.status_code),
            load_time: Set(page.load_time),
            word_count: Set(page.word_count),
            depth: Set(page.depth),
            meta: Set(to_json(&page.meta)?),
            created_at: Set(page.created_at.into()),
        };

        let txn = self.db.begin().await?;
        page_model.insert(&txn).await?;
        if !analysis.issues.is_empty() {
            issue_entity::Entity::insert_many(analysis.issues.iter().map(issue_to_active))
                .exec(&txn)
                .await?;
        }
        if !analysis.links.is_empty() {
            link_entity::Entity::insert_many(analysis.links.iter().map(link_to_active))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, RepositoryError> {
        page_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(page_from_model)
            .transpose()
    }

    async fn list_by_session(
        &self,
        session_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Page>, u64), RepositoryError> {
        let query = page_entity::Entity::find()
            .filter(page_entity::Column::SessionId.eq(session_id));

        let total = query.clone().count(self.db.as_ref()).await?;
        let pages = query
            .order_by_asc(page_entity::Column::CreatedAt)
            .order_by_asc(page_entity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(page_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((pages, total))
    }

    async fn find_links_from(&self, page_id: Uuid) -> Result<Vec<PageLink>, RepositoryError> {
        link_entity::Entity::find()
            .filter(link_entity::Column::FromPageId.eq(page_id))
            .order_by_asc(link_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(link_from_model)
            .collect()
    }
}
