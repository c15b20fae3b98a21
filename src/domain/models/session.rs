// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// 正则排除规则的前缀
pub const REGEX_PATTERN_PREFIX: &str = "re:";

/// 爬取配置
///
/// 会话创建时嵌入的不可变配置快照，会话启动后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// 最大爬取URL数
    pub max_urls: i32,
    /// 最大爬取深度（根URL深度为0）
    pub max_depth: i32,
    /// 同一主机两次请求之间的最小间隔（秒）
    pub delay: f64,
    /// 是否使用JavaScript渲染
    pub render_javascript: bool,
    /// 是否遵守robots.txt
    pub respect_robots: bool,
    /// 是否跟随重定向
    pub follow_redirects: bool,
    /// 排除规则，按顺序匹配；默认为子串匹配，`re:` 前缀表示正则表达式
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_urls: 100,
            max_depth: 3,
            delay: 1.0,
            render_javascript: false,
            respect_robots: true,
            follow_redirects: true,
            exclude_patterns: Vec::new(),
        }
    }
}

impl CrawlConfig {
    /// 校验配置边界
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 配置合法
    /// * `Err(String)` - 违反约束的描述
    pub fn validate(&self) -> Result<(), String> {
        if self.max_urls < 1 {
            return Err(format!("max_urls must be at least 1, got {}", self.max_urls));
        }
        if self.max_depth < 0 {
            return Err(format!(
                "max_depth must not be negative, got {}",
                self.max_depth
            ));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(format!("delay must be a non-negative number, got {}", self.delay));
        }
        self.compile_excludes().map(|_| ())
    }

    /// 编译排除规则
    pub fn compile_excludes(&self) -> Result<Vec<ExcludePattern>, String> {
        self.exclude_patterns
            .iter()
            .map(|raw| ExcludePattern::parse(raw))
            .collect()
    }

    /// 请求间隔
    pub fn delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.delay.max(0.0))
    }
}

/// 已编译的排除规则
#[derive(Debug, Clone)]
pub enum ExcludePattern {
    /// 子串匹配
    Substring(String),
    /// 正则匹配
    Regex(Regex),
}

impl ExcludePattern {
    /// 解析单条排除规则
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.strip_prefix(REGEX_PATTERN_PREFIX) {
            Some(expr) => Regex::new(expr)
                .map(ExcludePattern::Regex)
                .map_err(|e| format!("invalid exclude pattern '{}': {}", raw, e)),
            None if raw.is_empty() => Err("exclude pattern must not be empty".to_string()),
            None => Ok(ExcludePattern::Substring(raw.to_string())),
        }
    }

    /// 判断URL是否命中
    pub fn matches(&self, url: &str) -> bool {
        match self {
            ExcludePattern::Substring(s) => url.contains(s.as_str()),
            ExcludePattern::Regex(re) => re.is_match(url),
        }
    }
}

/// 会话状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed/Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// 已创建，尚未开始
    #[default]
    Pending,
    /// 运行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl SessionStatus {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }

    /// 是否为活跃状态（同一项目同时只允许一个活跃会话）
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Running)
    }

    /// 判断状态转换是否合法
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::Running)
                | (SessionStatus::Running, SessionStatus::Completed)
                | (SessionStatus::Running, SessionStatus::Failed)
                | (SessionStatus::Running, SessionStatus::Cancelled)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionStatus::Pending => write!(f, "pending"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "running" => Ok(SessionStatus::Running),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 爬取会话实体
///
/// 会话是聚合根，由会话管理器独占；工作器只通过运行时递增计数器。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSession {
    /// 会话唯一标识符
    pub id: Uuid,
    /// 所属项目ID
    pub project_id: Uuid,
    /// 会话状态
    pub status: SessionStatus,
    /// 配置快照
    pub config: CrawlConfig,
    /// 创建时间
    pub started_at: DateTime<Utc>,
    /// 进入终态的时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 致命错误信息
    pub error_message: Option<String>,
    /// 已成功爬取的URL数（单调递增）
    pub crawled_urls: i32,
    /// 重试耗尽后永久失败的URL数
    pub failed_urls: i32,
    /// 估算总数，前沿关闭后才可知
    pub total_urls: Option<i32>,
    /// 最后更新时间
    pub updated_at: DateTime<Utc>,
}

impl CrawlSession {
    /// 创建处于 `pending` 状态的新会话
    pub fn new(project_id: Uuid, config: CrawlConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            status: SessionStatus::Pending,
            config,
            started_at: now,
            completed_at: None,
            error_message: None,
            crawled_urls: 0,
            failed_urls: 0,
            total_urls: None,
            updated_at: now,
        }
    }
}
