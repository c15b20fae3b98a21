// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::session_repository::RepositoryError;
use crate::queue::queue_store::QueueError;
use thiserror::Error;

/// 会话管理错误
///
/// 管理接口面向调用方的错误分类；单个URL的抓取与分析错误在工作器内部恢复，
/// 不会出现在这里。
#[derive(Error, Debug)]
pub enum SessionError {
    /// 配置违反约束，会话不会被创建
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 会话已启动
    #[error("Session already started")]
    AlreadyStarted,

    /// 会话不存在
    #[error("Session not found")]
    NotFound,

    /// 项目不存在
    #[error("Project not found")]
    ProjectNotFound,

    /// 与已有会话冲突
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 当前状态不允许该操作
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 种子阶段的致命错误，会话已标记为失败
    #[error("Fatal seed error: {0}")]
    FatalSeed(String),

    /// 队列状态机拒绝了转换
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
