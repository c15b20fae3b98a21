// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::session::CrawlSession;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 唯一性冲突
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 会话仓库特质
///
/// 定义爬取会话的持久化接口。会话的全部写入都来自会话运行时，
/// 因此 `update` 以整行覆盖的方式保存状态与计数器。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 创建会话
    ///
    /// # 参数
    ///
    /// * `session` - 新建的会话实体
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSession)` - 成功创建后返回会话
    /// * `Err(RepositoryError)` - 创建失败时返回错误
    async fn create(&self, session: &CrawlSession) -> Result<CrawlSession, RepositoryError>;

    /// 根据ID查找会话
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CrawlSession>, RepositoryError>;

    /// 保存会话的状态、计数器与时间戳
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError::NotFound)` - 会话不存在
    async fn update(&self, session: &CrawlSession) -> Result<(), RepositoryError>;

    /// 查找项目当前的活跃会话（pending 或 running）
    async fn find_active_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<CrawlSession>, RepositoryError>;
}
