// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session::{CrawlSession, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// 状态变化
    StatusChanged,
    /// 计数器变化
    CountersChanged,
}

/// 会话事件
///
/// 每次状态或计数器变化时推送，内容与 `GET` 快照同源。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub crawled_urls: i32,
    pub failed_urls: i32,
    pub total_urls: Option<i32>,
    pub error_message: Option<String>,
    pub at: DateTime<Utc>,
}

impl SessionEvent {
    pub fn from_session(kind: SessionEventKind, session: &CrawlSession) -> Self {
        Self {
            kind,
            session_id: session.id,
            status: session.status,
            crawled_urls: session.crawled_urls,
            failed_urls: session.failed_urls,
            total_urls: session.total_urls,
            error_message: session.error_message.clone(),
            at: session.updated_at,
        }
    }
}
