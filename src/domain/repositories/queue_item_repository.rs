// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session_repository::RepositoryError;
use crate::domain::models::queue_item::QueueItem;
use async_trait::async_trait;
use uuid::Uuid;

/// 队列项仓库特质
///
/// 队列状态的权威副本保存在会话运行时的内存队列中，
/// 仓库只负责持久化每一次状态转换以便审计与查询。
#[async_trait]
pub trait QueueItemRepository: Send + Sync {
    /// 插入新的队列项
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 插入成功
    /// * `Err(RepositoryError::Conflict)` - 同一会话内URL重复
    async fn insert(&self, item: &QueueItem) -> Result<(), RepositoryError>;

    /// 保存队列项的状态与尝试次数
    async fn update(&self, item: &QueueItem) -> Result<(), RepositoryError>;

    /// 将会话内剩余的 pending 项标记为 cancelled
    ///
    /// # 返回值
    ///
    /// * `Ok(u64)` - 被标记的队列项数量
    async fn cancel_pending(&self, session_id: Uuid) -> Result<u64, RepositoryError>;

    /// 按入队顺序列出会话的全部队列项
    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<QueueItem>, RepositoryError>;
}
