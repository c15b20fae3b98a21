// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 领域仓库接口的 SeaORM 实现与进程内实现
pub mod analytics_repo_impl;
mod columns;
pub mod issue_repo_impl;
pub mod memory_store;
pub mod page_repo_impl;
pub mod project_repo_impl;
pub mod queue_item_repo_impl;
pub mod session_repo_impl;

use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::repositories::issue_repository::IssueRepository;
use crate::domain::repositories::page_repository::PageRepository;
use crate::domain::repositories::project_repository::ProjectRepository;
use crate::domain::repositories::queue_item_repository::QueueItemRepository;
use crate::domain::repositories::session_repository::SessionRepository;
use analytics_repo_impl::AnalyticsRepositoryImpl;
use issue_repo_impl::IssueRepositoryImpl;
use memory_store::MemoryStore;
use page_repo_impl::PageRepositoryImpl;
use project_repo_impl::ProjectRepositoryImpl;
use queue_item_repo_impl::QueueItemRepositoryImpl;
use sea_orm::DatabaseConnection;
use session_repo_impl::SessionRepositoryImpl;
use std::sync::Arc;

/// 全部仓库的集合
///
/// 按持久化后端一次性构造，之后以特质对象传给各组件。
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub queue_items: Arc<dyn QueueItemRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub issues: Arc<dyn IssueRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl Repositories {
    /// SeaORM 实现
    pub fn database(db: Arc<DatabaseConnection>) -> Self {
        Self {
            projects: Arc::new(ProjectRepositoryImpl::new(db.clone())),
            sessions: Arc::new(SessionRepositoryImpl::new(db.clone())),
            queue_items: Arc::new(QueueItemRepositoryImpl::new(db.clone())),
            pages: Arc::new(PageRepositoryImpl::new(db.clone())),
            issues: Arc::new(IssueRepositoryImpl::new(db.clone())),
            analytics: Arc::new(AnalyticsRepositoryImpl::new(db)),
        }
    }

    /// 所有仓库共享同一个内存存储
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            projects: store.clone(),
            sessions: store.clone(),
            queue_items: store.clone(),
            pages: store.clone(),
            issues: store.clone(),
            analytics: store,
        }
    }
}
