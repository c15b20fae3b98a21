// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::issue::{Category, Issue, Severity};
use crate::domain::models::page::Page;
use crate::domain::models::page_link::PageLink;
use crate::domain::models::session::SessionStatus;
use crate::domain::services::progress_estimator::Progress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 默认分页大小
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// 分页查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct PaginationQuery {
    pub offset: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

impl PaginationQuery {
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

/// 问题列表查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct IssueQueryDto {
    /// 严重程度过滤
    pub severity: Option<Severity>,
    /// 类别过滤
    pub category: Option<Category>,
    pub offset: Option<u64>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// 分页列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponseDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// 页面详情响应
#[derive(Debug, Serialize, Deserialize)]
pub struct PageDetailDto {
    #[serde(flatten)]
    pub page: Page,
    pub issues: Vec<Issue>,
    pub links: Vec<PageLink>,
}

/// 会话进度响应
#[derive(Debug, Serialize)]
pub struct ProgressDto {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub crawled_urls: i32,
    pub failed_urls: i32,
    pub total_urls: Option<i32>,
    #[serde(flatten)]
    pub progress: Progress,
}
