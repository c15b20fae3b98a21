// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session_repository::RepositoryError;
use crate::domain::models::summary::SessionSnapshot;
use async_trait::async_trait;
use uuid::Uuid;

/// 统计读取仓库特质
///
/// 汇总计算只依赖一次快照读取：返回读取开始时已提交的页面与问题，
/// 读取方不持有写入方的锁。
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// 读取会话的页面与问题快照
    async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, RepositoryError>;
}
