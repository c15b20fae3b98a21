// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::issue::Issue;
use crate::domain::models::page::Page;
use crate::domain::models::page_link::PageLink;
use crate::domain::models::project::Project;
use crate::domain::models::queue_item::{QueueItem, QueueItemStatus};
use crate::domain::models::session::CrawlSession;
use crate::domain::models::summary::{IssueFacts, PageFacts, SessionSnapshot};
use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::repositories::issue_repository::{IssueQuery, IssueRepository};
use crate::domain::repositories::page_repository::{PageAnalysis, PageRepository};
use crate::domain::repositories::project_repository::ProjectRepository;
use crate::domain::repositories::queue_item_repository::QueueItemRepository;
use crate::domain::repositories::session_repository::{RepositoryError, SessionRepository};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    projects: HashMap<Uuid, Project>,
    sessions: HashMap<Uuid, CrawlSession>,
    queue_items: HashMap<Uuid, QueueItem>,
    pages: Vec<Page>,
    issues: Vec<Issue>,
    links: Vec<PageLink>,
}

/// 内存存储
///
/// 以单把读写锁保护全部表，实现所有仓库特质。页面分析在写锁内整体追加，
/// 统计快照在读锁内一次性复制，因此读者看到的总是已完整提交的页面集合。
/// 用于 `persistence.backend = "memory"` 与测试。
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 会话的全部页面（按写入顺序）
    pub fn pages_of(&self, session_id: Uuid) -> Vec<Page> {
        self.tables
            .read()
            .pages
            .iter()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect()
    }
}

fn paginate<T: Clone>(rows: Vec<T>, offset: u64, limit: u64) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let page = rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();
    (page, total)
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.projects.contains_key(&project.id) {
            return Err(RepositoryError::Conflict(format!("project {}", project.id)));
        }
        tables.projects.insert(project.id, project.clone());
        Ok(project.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        Ok(self.tables.read().projects.get(&id).cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, session: &CrawlSession) -> Result<CrawlSession, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict(format!("session {}", session.id)));
        }
        tables.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlSession>, RepositoryError> {
        Ok(self.tables.read().sessions.get(&id).cloned())
    }

    async fn update(&self, session: &CrawlSession) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let stored = tables
            .sessions
            .get_mut(&session.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = session.clone();
        Ok(())
    }

    async fn find_active_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<CrawlSession>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .sessions
            .values()
            .filter(|s| s.project_id == project_id && s.status.is_active())
            .max_by_key(|s| s.started_at)
            .cloned())
    }
}

#[async_trait]
impl QueueItemRepository for MemoryStore {
    async fn insert(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .queue_items
            .values()
            .any(|i| i.session_id == item.session_id && i.url == item.url);
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "url {} already queued in session {}",
                item.url, item.session_id
            )));
        }
        tables.queue_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let stored = tables
            .queue_items
            .get_mut(&item.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.status = item.status;
        stored.attempt_count = item.attempt_count;
        stored.updated_at = item.updated_at;
        Ok(())
    }

    async fn cancel_pending(&self, session_id: Uuid) -> Result<u64, RepositoryError> {
        let now = Utc::now();
        let mut tables = self.tables.write();
        let mut cancelled = 0;
        for item in tables.queue_items.values_mut() {
            if item.session_id == session_id && item.status == QueueItemStatus::Pending {
                item.status = QueueItemStatus::Cancelled;
                item.updated_at = now;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<QueueItem>, RepositoryError> {
        let mut items: Vec<QueueItem> = self
            .tables
            .read()
            .queue_items
            .values()
            .filter(|i| i.session_id == session_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.seq);
        Ok(items)
    }
}

#[async_trait]
impl PageRepository for MemoryStore {
    async fn save_analysis(&self, analysis: &PageAnalysis) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        if tables.pages.iter().any(|p| p.id == analysis.page.id) {
            return Err(RepositoryError::Conflict(format!("page {}", analysis.page.id)));
        }
        tables.pages.push(analysis.page.clone());
        tables.issues.extend(analysis.issues.iter().cloned());
        tables.links.extend(analysis.links.iter().cloned());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, RepositoryError> {
        Ok(self.tables.read().pages.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_session(
        &self,
        session_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Page>, u64), RepositoryError> {
        Ok(paginate(self.pages_of(session_id), offset, limit))
    }

    async fn find_links_from(&self, page_id: Uuid) -> Result<Vec<PageLink>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .links
            .iter()
            .filter(|l| l.from_page_id == page_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IssueRepository for MemoryStore {
    async fn list_by_session(
        &self,
        query: &IssueQuery,
    ) -> Result<(Vec<Issue>, u64), RepositoryError> {
        let mut issues: Vec<Issue> = self
            .tables
            .read()
            .issues
            .iter()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal scores
        issues.sort_by(|a, b| b.impact_score.cmp(&a.impact_score));
        Ok(paginate(issues, query.offset, query.limit))
    }

    async fn list_by_page(&self, page_id: Uuid) -> Result<Vec<Issue>, RepositoryError> {
        let mut issues: Vec<Issue> = self
            .tables
            .read()
            .issues
            .iter()
            .filter(|i| i.page_id == page_id)
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.impact_score.cmp(&a.impact_score));
        Ok(issues)
    }
}

#[async_trait]
impl AnalyticsRepository for MemoryStore {
    async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, RepositoryError> {
        let tables = self.tables.read();
        let pages = tables
            .pages
            .iter()
            .filter(|p| p.session_id == session_id)
            .map(|p| PageFacts {
                page_id: p.id,
                status_code: p.status_code,
                load_time: p.load_time,
                word_count: p.word_count,
            })
            .collect();
        let issues = tables
            .issues
            .iter()
            .filter(|i| i.session_id == session_id)
            .map(|i| IssueFacts {
                page_id: i.page_id,
                severity: i.severity,
                category: i.category,
            })
            .collect();
        Ok(SessionSnapshot { pages, issues })
    }
}
