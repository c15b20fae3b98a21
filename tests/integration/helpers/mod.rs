// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use seocrawl::application::session_manager::SessionManager;
use seocrawl::config::settings::CrawlerSettings;
use seocrawl::domain::models::project::Project;
use seocrawl::domain::models::session::{CrawlConfig, CrawlSession};
use seocrawl::domain::repositories::project_repository::ProjectRepository;
use seocrawl::domain::services::issue_detector::IssueDetector;
use seocrawl::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use seocrawl::infrastructure::repositories::memory_store::MemoryStore;
use seocrawl::infrastructure::repositories::Repositories;
use seocrawl::utils::robots::RobotsCheckerTrait;
use seocrawl::workers::crawl_worker::WorkerDeps;
use seocrawl::workers::WorkerPool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// 测试站点根URL
pub const SITE: &str = "https://site.test";

/// 页面文档，带标题、描述与给定的链接
pub fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        r#"<html lang="en"><head><title>{title}</title>
        <meta name="description" content="A page about {title} with enough descriptive text to satisfy length checks for the description tag.">
        </head><body><h1>{title}</h1><p>Some words about {title}.</p>{anchors}</body></html>"#
    )
}

#[derive(Clone)]
enum Route {
    Page { status: u16, html: String },
    Error(fn() -> EngineError),
}

/// 内存中的测试站点
///
/// 实现 `FetchEngine`，按完整URL返回预置的响应。可以让指定URL的抓取
/// 阻塞在信号量上，以便在抓取进行中观察会话状态。
pub struct FakeSite {
    routes: Mutex<HashMap<String, Route>>,
    gated: Mutex<HashSet<String>>,
    gate: Semaphore,
    started: AtomicUsize,
    fetches: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            gated: Mutex::new(HashSet::new()),
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// 注册 200 HTML 页面，`path` 相对于 [`SITE`]
    pub fn page(self, path: &str, html: String) -> Self {
        self.status_page(path, 200, html)
    }

    pub fn status_page(self, path: &str, status: u16, html: String) -> Self {
        self.routes
            .lock()
            .insert(format!("{}{}", SITE, path), Route::Page { status, html });
        self
    }

    /// 该路径的每次抓取都返回错误
    pub fn failing(self, path: &str, error: fn() -> EngineError) -> Self {
        self.routes
            .lock()
            .insert(format!("{}{}", SITE, path), Route::Error(error));
        self
    }

    /// 该路径的抓取阻塞，直到 [`FakeSite::release`]
    pub fn gated(self, path: &str) -> Self {
        self.gated.lock().insert(format!("{}{}", SITE, path));
        self
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    /// 已开始（含阻塞中）的抓取次数
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// 已完成的抓取URL
    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl FetchEngine for FakeSite {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let gated = self.gated.lock().contains(&request.url);
        if gated {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| EngineError::Other(e.to_string()))?;
            permit.forget();
        }

        let route = self.routes.lock().get(&request.url).cloned();
        self.fetches.lock().push(request.url.clone());
        match route {
            Some(Route::Error(error)) => Err(error()),
            Some(Route::Page { status, html }) => Ok(response(&request.url, status, html)),
            None => Ok(response(
                &request.url,
                404,
                "<html><head><title>Not found</title></head><body></body></html>".to_string(),
            )),
        }
    }

    fn support_score(&self, _request: &FetchRequest) -> u8 {
        100
    }

    fn name(&self) -> &'static str {
        "fake-site"
    }
}

fn response(url: &str, status: u16, html: String) -> FetchResponse {
    FetchResponse {
        status_code: Some(status),
        html,
        final_url: url.to_string(),
        content_type: Some("text/html; charset=utf-8".to_string()),
        load_time: Duration::from_millis(20),
    }
}

/// robots.txt 检查器替身
#[derive(Default)]
pub struct FakeRobots {
    disallowed: HashSet<String>,
}

impl FakeRobots {
    pub fn disallow(paths: &[&str]) -> Self {
        Self {
            disallowed: paths.iter().map(|p| format!("{}{}", SITE, p)).collect(),
        }
    }
}

#[async_trait]
impl RobotsCheckerTrait for FakeRobots {
    async fn is_allowed(&self, url_str: &str, _user_agent: &str) -> anyhow::Result<bool> {
        Ok(!self.disallowed.contains(url_str))
    }

    async fn get_crawl_delay(
        &self,
        _url_str: &str,
        _user_agent: &str,
    ) -> anyhow::Result<Option<Duration>> {
        Ok(None)
    }
}

/// 测试用爬虫配置：短退避、短超时
pub fn crawler_settings(worker_count: usize) -> CrawlerSettings {
    CrawlerSettings {
        worker_count,
        request_timeout_secs: 5,
        claim_backoff_ms: 5,
        ..CrawlerSettings::default()
    }
}

/// 不等待的会话配置
pub fn fast_config(max_urls: i32, max_depth: i32) -> CrawlConfig {
    CrawlConfig {
        max_urls,
        max_depth,
        delay: 0.0,
        ..CrawlConfig::default()
    }
}

/// 完整装配的爬虫：内存存储 + 工作器池 + 会话管理器
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub repos: Repositories,
    pub manager: Arc<SessionManager>,
    pub pool: Arc<WorkerPool>,
    pub project: Project,
}

impl Harness {
    /// 等待会话进入终态，超时视为测试失败
    pub async fn finish(&self, session: &CrawlSession) -> CrawlSession {
        tokio::time::timeout(Duration::from_secs(10), self.manager.wait_finished(session.id))
            .await
            .expect("session did not finish in time")
            .unwrap()
    }
}

pub async fn harness(fetcher: Arc<dyn FetchEngine>, worker_count: usize) -> Harness {
    harness_with(fetcher, Arc::new(FakeRobots::default()), worker_count, SITE).await
}

pub async fn harness_with(
    fetcher: Arc<dyn FetchEngine>,
    robots: Arc<dyn RobotsCheckerTrait>,
    worker_count: usize,
    domain: &str,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let repos = Repositories::memory(store.clone());
    let settings = crawler_settings(worker_count);

    let pool = Arc::new(WorkerPool::new(WorkerDeps {
        fetcher,
        robots,
        pages: repos.pages.clone(),
        detector: Arc::new(IssueDetector::new()),
        settings: settings.clone(),
    }));
    let manager = Arc::new(SessionManager::new(
        repos.projects.clone(),
        repos.sessions.clone(),
        repos.queue_items.clone(),
        pool.clone(),
        settings,
    ));

    let project = Project::new("Fixture", domain);
    repos.projects.create(&project).await.unwrap();

    Harness {
        store,
        repos,
        manager,
        pool,
        project,
    }
}
