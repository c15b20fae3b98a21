// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::session_manager::SessionManager;
use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::repositories::issue_repository::IssueRepository;
use crate::domain::repositories::page_repository::PageRepository;
use crate::presentation::handlers::{
    issue_handler, page_handler, report_handler, session_handler, ws_handler,
};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由依赖
///
/// 以 `Extension` 注入到各处理器。
#[derive(Clone)]
pub struct ApiDeps {
    /// 会话管理器
    pub manager: Arc<SessionManager>,
    /// 页面仓库
    pub pages: Arc<dyn PageRepository>,
    /// 问题仓库
    pub issues: Arc<dyn IssueRepository>,
    /// 统计仓库
    pub analytics: Arc<dyn AnalyticsRepository>,
}

/// 创建应用路由
///
/// # 参数
///
/// * `deps` - 处理器依赖
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(deps: ApiDeps) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/version", get(version));

    let crawl_routes = Router::new()
        .route(
            "/api/projects/{id}/crawls",
            post(session_handler::create_crawl),
        )
        .route("/api/crawls/{id}", get(session_handler::get_crawl))
        .route("/api/crawls/{id}/stop", post(session_handler::stop_crawl))
        .route(
            "/api/crawls/{id}/progress",
            get(session_handler::get_progress),
        )
        .route("/api/crawls/{id}/pages", get(page_handler::list_pages))
        .route("/api/crawls/{id}/issues", get(issue_handler::list_issues))
        .route("/api/crawls/{id}/summary", get(report_handler::get_summary))
        .route("/api/crawls/{id}/live", get(ws_handler::session_events))
        .route("/api/pages/{id}", get(page_handler::get_page));

    Router::new()
        .merge(public_routes)
        .merge(crawl_routes)
        .layer(Extension(deps.manager))
        .layer(Extension(deps.pages))
        .layer(Extension(deps.issues))
        .layer(Extension(deps.analytics))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
