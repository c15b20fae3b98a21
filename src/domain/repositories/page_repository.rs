// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session_repository::RepositoryError;
use crate::domain::models::issue::Issue;
use crate::domain::models::page::Page;
use crate::domain::models::page_link::PageLink;
use async_trait::async_trait;
use uuid::Uuid;

/// 单个页面的完整分析结果
///
/// 页面、问题与链接作为一个整体原子提交，读取方不会看到只有部分问题的页面。
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub page: Page,
    pub issues: Vec<Issue>,
    pub links: Vec<PageLink>,
}

/// 页面仓库特质
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// 原子地保存页面及其问题与链接
    ///
    /// # 参数
    ///
    /// * `analysis` - 页面分析结果
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 全部写入成功
    /// * `Err(RepositoryError)` - 写入失败，不留下任何部分数据
    async fn save_analysis(&self, analysis: &PageAnalysis) -> Result<(), RepositoryError>;

    /// 根据ID查找页面
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, RepositoryError>;

    /// 分页列出会话的页面
    ///
    /// # 返回值
    ///
    /// * `Ok((Vec<Page>, u64))` - 当前页数据与总数
    async fn list_by_session(
        &self,
        session_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Page>, u64), RepositoryError>;

    /// 列出页面的出站链接
    async fn find_links_from(&self, page_id: Uuid) -> Result<Vec<PageLink>, RepositoryError>;
}
