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

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::application::session_runtime::{Claim, SessionRuntime};
use crate::config::settings::CrawlerSettings;
use crate::domain::models::page::{Page, PageMeta};
use crate::domain::models::page_link::{LinkType, PageLink};
use crate::domain::models::queue_item::QueueItem;
use crate::domain::models::session::CrawlConfig;
use crate::domain::repositories::page_repository::{PageAnalysis, PageRepository};
use crate::domain::services::aggregator::status_bucket;
use crate::domain::services::issue_detector::IssueDetector;
use crate::domain::services::link_discoverer::LinkDiscoverer;
use crate::domain::services::page_extractor::{AnalysisError, PageExtractor};
use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use crate::infrastructure::metrics::{
    FETCH_DURATION_SECONDS, FETCH_FAILURES_TOTAL, ISSUES_TOTAL, PAGES_TOTAL,
};
use crate::utils::robots::RobotsCheckerTrait;
use crate::workers::host_pacer::HostPacer;

/// 工作器共享依赖
///
/// 所有会话的工作器共用同一组抓取引擎、robots 检查器、页面仓库与问题检测器。
#[derive(Clone)]
pub struct WorkerDeps {
    /// 抓取引擎（通常是引擎路由器）
    pub fetcher: Arc<dyn FetchEngine>,
    /// robots.txt 检查器
    pub robots: Arc<dyn RobotsCheckerTrait>,
    /// 页面仓库
    pub pages: Arc<dyn PageRepository>,
    /// 问题检测器
    pub detector: Arc<IssueDetector>,
    /// 爬虫运行配置
    pub settings: CrawlerSettings,
}

/// 爬取工作器
///
/// 循环执行 领取 → 节流 → robots 检查 → 抓取 → 分析 → 持久化 → 完成，
/// 直到会话结束或请求取消。分析阶段的任何错误都转换为 `analysis_failed`
/// 问题，队列项仍然完成。
pub struct CrawlWorker {
    worker_index: usize,
    runtime: Arc<SessionRuntime>,
    deps: WorkerDeps,
    pacer: Arc<HostPacer>,
    config: CrawlConfig,
    project_host: String,
}

impl CrawlWorker {
    /// 创建爬取工作器
    ///
    /// # 参数
    ///
    /// * `worker_index` - 工作器在会话内的序号，仅用于日志
    /// * `runtime` - 会话运行时
    /// * `deps` - 共享依赖
    /// * `pacer` - 会话级主机节流器
    /// * `config` - 会话的爬取配置
    /// * `project_host` - 项目主机名，用于区分站内外链接
    pub fn new(
        worker_index: usize,
        runtime: Arc<SessionRuntime>,
        deps: WorkerDeps,
        pacer: Arc<HostPacer>,
        config: CrawlConfig,
        project_host: String,
    ) -> Self {
        Self {
            worker_index,
            runtime,
            deps,
            pacer,
            config,
            project_host,
        }
    }

    /// 运行工作器直到会话不再发放队列项
    pub async fn run(self) {
        let session_id = self.runtime.session_id();
        debug!(%session_id, worker = self.worker_index, "Crawl worker started");

        loop {
            match self.runtime.claim().await {
                Ok(Claim::Item(item)) => self.process(item).await,
                Ok(Claim::Empty) => sleep(self.backoff()).await,
                Ok(Claim::Finished) => break,
                Err(e) => {
                    error!(%session_id, "Failed to claim queue item: {}", e);
                    sleep(self.backoff()).await;
                }
            }
        }

        debug!(%session_id, worker = self.worker_index, "Crawl worker exited");
    }

    /// 队列暂时为空时的退避时间，带随机抖动避免工作器同步轮询
    fn backoff(&self) -> Duration {
        let base = self.deps.settings.claim_backoff();
        let jitter = rand::rng().random_range(0..=base.as_millis() as u64);
        base + Duration::from_millis(jitter)
    }

    #[instrument(
        skip(self, item),
        fields(session_id = %item.session_id, item_id = %item.id, url = %item.url, depth = item.depth)
    )]
    async fn process(&self, item: QueueItem) {
        let url = match Url::parse(&item.url) {
            Ok(url) => url,
            Err(e) => {
                self.record_failure(&item, &EngineError::Other(format!("Invalid URL: {}", e)))
                    .await;
                return;
            }
        };

        self.pace(&url).await;

        if self.config.respect_robots {
            match self
                .deps
                .robots
                .is_allowed(url.as_str(), &self.deps.settings.user_agent)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    self.record_failure(&item, &EngineError::RobotsDisallowed)
                        .await;
                    return;
                }
                Err(e) => warn!("Robots check failed, assuming allowed: {}", e),
            }
        }

        let request = FetchRequest {
            url: item.url.clone(),
            timeout: self.deps.settings.request_timeout(),
            follow_redirects: self.config.follow_redirects,
            render_javascript: self.config.render_javascript,
            user_agent: self.deps.settings.user_agent.clone(),
        };
        let response = match self.deps.fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.record_failure(&item, &e).await;
                return;
            }
        };
        metrics::histogram!(FETCH_DURATION_SECONDS).record(response.load_time.as_secs_f64());

        let analysis = self.analyze(&item, response).await;
        if let Err(e) = self.deps.pages.save_analysis(&analysis).await {
            error!("Failed to persist page: {}", e);
            if let Err(e) = self
                .runtime
                .fail(item.id, true, &format!("Failed to persist page: {}", e))
                .await
            {
                error!("Failed to record item failure: {}", e);
            }
            return;
        }

        metrics::counter!(PAGES_TOTAL, "status" => status_bucket(analysis.page.status_code))
            .increment(1);
        for issue in &analysis.issues {
            metrics::counter!(ISSUES_TOTAL, "severity" => issue.severity.to_string()).increment(1);
        }

        let internal: Vec<String> = analysis
            .links
            .iter()
            .filter(|link| link.link_type == LinkType::Internal)
            .map(|link| link.to_url.clone())
            .collect();

        match self.runtime.complete(item.id, &internal).await {
            Ok(accepted) => info!(
                status = ?analysis.page.status_code,
                issues = analysis.issues.len(),
                links = analysis.links.len(),
                accepted,
                "Page crawled"
            ),
            Err(e) => error!("Failed to complete queue item: {}", e),
        }
    }

    async fn pace(&self, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };
        let respect_robots = self.config.respect_robots;
        let robots = self.deps.robots.clone();
        let user_agent = &self.deps.settings.user_agent;

        self.pacer
            .wait(host, || async move {
                if !respect_robots {
                    return None;
                }
                match robots.get_crawl_delay(url.as_str(), user_agent).await {
                    Ok(delay) => delay,
                    Err(e) => {
                        debug!("Crawl-delay lookup failed: {}", e);
                        None
                    }
                }
            })
            .await;
    }

    async fn record_failure(&self, item: &QueueItem, error: &EngineError) {
        let retryable = error.is_retryable();
        metrics::counter!(FETCH_FAILURES_TOTAL, "retryable" => retryable.to_string())
            .increment(1);
        warn!(retryable, "Fetch failed: {}", error);

        if let Err(e) = self
            .runtime
            .fail(item.id, retryable, &error.to_string())
            .await
        {
            error!("Failed to record item failure: {}", e);
        }
    }

    /// 分析抓取结果
    ///
    /// HTML 文档在阻塞线程池中解析；非 HTML 响应只持久化状态码与耗时。
    async fn analyze(&self, item: &QueueItem, response: FetchResponse) -> PageAnalysis {
        let page = Page {
            id: Uuid::new_v4(),
            session_id: item.session_id,
            queue_item_id: item.id,
            url: item.url.clone(),
            title: None,
            status_code: response.status_code.map(i32::from),
            load_time: response.load_time.as_secs_f64(),
            word_count: None,
            depth: item.depth,
            meta: PageMeta {
                final_url: Some(response.final_url.clone()),
                ..Default::default()
            },
            created_at: Utc::now(),
        };

        if !response.is_html() {
            debug!(content_type = ?response.content_type, "Skipping analysis of non-HTML response");
            return PageAnalysis {
                page,
                issues: Vec::new(),
                links: Vec::new(),
            };
        }

        let fallback = page.clone();
        let detector = self.deps.detector.clone();
        let project_host = self.project_host.clone();
        let task = tokio::task::spawn_blocking(move || {
            analyze_document(page, &response.html, &project_host, &detector)
        });

        match task.await {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => analysis_failed(fallback, &e),
            Err(e) => analysis_failed(fallback, &AnalysisError::Aborted(e.to_string())),
        }
    }
}

/// 分析 HTML 文档
///
/// 提取页面事实、运行问题检测，并为成功页面发现出站链接。错误页面的链接不跟随。
///
/// # 参数
///
/// * `page` - 已填充抓取信息的页面，`meta.final_url` 作为相对链接基准
/// * `html` - HTML 文档
/// * `project_host` - 项目主机名
/// * `detector` - 问题检测器
///
/// # 返回值
///
/// * `Ok(PageAnalysis)` - 页面、问题与链接
/// * `Err(AnalysisError)` - 提取失败
pub fn analyze_document(
    mut page: Page,
    html: &str,
    project_host: &str,
    detector: &IssueDetector,
) -> Result<PageAnalysis, AnalysisError> {
    let final_url = page
        .meta
        .final_url
        .clone()
        .unwrap_or_else(|| page.url.clone());

    let extracted = PageExtractor::extract(html, &final_url)?;
    page.title = extracted.title;
    page.word_count = Some(extracted.word_count);
    page.meta = extracted.meta;

    let issues = detector.detect(&page);

    let links = if page.is_success() {
        let base = Url::parse(&final_url)
            .or_else(|_| Url::parse(&page.url))
            .map_err(|_| AnalysisError::InvalidUrl(final_url.clone()))?;
        LinkDiscoverer::extract_links(html, &base, project_host)?
            .into_iter()
            .map(|link| PageLink::new(page.session_id, page.id, link.url, link.link_type))
            .collect()
    } else {
        Vec::new()
    };

    Ok(PageAnalysis {
        page,
        issues,
        links,
    })
}

fn analysis_failed(page: Page, error: &AnalysisError) -> PageAnalysis {
    warn!(url = %page.url, "Page analysis failed: {}", error);
    let issue = IssueDetector::analysis_failed(page.id, page.session_id, &error.to_string());
    PageAnalysis {
        page,
        issues: vec![issue],
        links: Vec::new(),
    }
}
