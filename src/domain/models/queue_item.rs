// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 队列项实体
///
/// 会话内的一个爬取目标。URL 已规范化，同一会话内唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// 队列项唯一标识符
    pub id: Uuid,
    /// 所属会话ID
    pub session_id: Uuid,
    /// 规范化后的URL
    pub url: String,
    /// 深度，根URL为0
    pub depth: i32,
    /// 队列项状态
    pub status: QueueItemStatus,
    /// 已尝试次数
    pub attempt_count: i32,
    /// 发现该URL的页面ID
    pub discovered_from: Option<Uuid>,
    /// 入队序号，用于同深度内的插入顺序
    pub seq: i64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl QueueItem {
    /// 创建新的待处理队列项
    pub fn new(
        session_id: Uuid,
        url: String,
        depth: i32,
        discovered_from: Option<Uuid>,
        seq: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            url,
            depth,
            status: QueueItemStatus::Pending,
            attempt_count: 0,
            discovered_from,
            seq,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 队列项状态枚举
///
/// Pending → Processing → Completed/Failed，Processing 可因重试回到 Pending；
/// 会话取消时剩余的 Pending 项被标记为 Cancelled 留档。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    /// 等待领取
    #[default]
    Pending,
    /// 处理中
    Processing,
    /// 已完成
    Completed,
    /// 永久失败
    Failed,
    /// 已放弃（会话取消）
    Cancelled,
}

impl QueueItemStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueueItemStatus::Completed | QueueItemStatus::Failed | QueueItemStatus::Cancelled
        )
    }
}

impl fmt::Display for QueueItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueItemStatus::Pending => write!(f, "pending"),
            QueueItemStatus::Processing => write!(f, "processing"),
            QueueItemStatus::Completed => write!(f, "completed"),
            QueueItemStatus::Failed => write!(f, "failed"),
            QueueItemStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for QueueItemStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueItemStatus::Pending),
            "processing" => Ok(QueueItemStatus::Processing),
            "completed" => Ok(QueueItemStatus::Completed),
            "failed" => Ok(QueueItemStatus::Failed),
            "cancelled" => Ok(QueueItemStatus::Cancelled),
            _ => Err(()),
        }
    }
}
