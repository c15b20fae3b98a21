// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// robots.txt 禁止访问
    #[error("Disallowed by robots.txt")]
    RobotsDisallowed,
    /// 浏览器渲染失败
    #[error("Render failed: {0}")]
    Render(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 超时、连接错误与 5xx 类请求错误返回 true，robots 禁止等永久性错误返回 false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::Timeout => true,
            EngineError::Render(_) => true,
            EngineError::RobotsDisallowed | EngineError::Other(_) => false,
        }
    }
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 超时时间
    pub timeout: Duration,
    /// 是否跟随重定向
    pub follow_redirects: bool,
    /// 是否需要渲染 JavaScript
    pub render_javascript: bool,
    /// User-Agent
    pub user_agent: String,
}

/// 抓取响应
///
/// 管线只依赖这几项：HTML文档、最终状态码、最终URL与加载耗时。
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码，渲染引擎无法获得时为 `None`
    pub status_code: Option<u16>,
    /// HTML 文档
    pub html: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
    /// 内容类型
    pub content_type: Option<String>,
    /// 加载耗时
    pub load_time: Duration,
}

impl FetchResponse {
    /// 响应是否为 HTML 文档
    ///
    /// 缺少内容类型时按 HTML 处理。
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true)
    }
}

/// 抓取引擎特质
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;

    /// 计算对请求的支持分数（0-100）
    fn support_score(&self, request: &FetchRequest) -> u8;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
