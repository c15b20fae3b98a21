// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session_repository::RepositoryError;
use crate::domain::models::issue::{Category, Issue, Severity};
use async_trait::async_trait;
use uuid::Uuid;

/// 问题查询参数
#[derive(Debug, Clone)]
pub struct IssueQuery {
    pub session_id: Uuid,
    pub severity: Option<Severity>,
    pub category: Option<Category>,
    pub offset: u64,
    pub limit: u64,
}

impl IssueQuery {
    /// 判断问题是否满足过滤条件
    pub fn matches(&self, issue: &Issue) -> bool {
        issue.session_id == self.session_id
            && self.severity.map_or(true, |s| s == issue.severity)
            && self.category.map_or(true, |c| c == issue.category)
    }
}

/// 问题仓库特质
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// 按条件分页列出会话的问题，按影响分数降序
    ///
    /// # 返回值
    ///
    /// * `Ok((Vec<Issue>, u64))` - 当前页数据与满足条件的总数
    async fn list_by_session(&self, query: &IssueQuery)
        -> Result<(Vec<Issue>, u64), RepositoryError>;

    /// 列出页面的全部问题
    async fn list_by_page(&self, page_id: Uuid) -> Result<Vec<Issue>, RepositoryError>;
}
