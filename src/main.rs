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

use reqwest::Client;
use seocrawl::application::session_manager::SessionManager;
use seocrawl::config::settings::{PersistenceBackend, SeedProject, Settings};
use seocrawl::domain::models::project::Project;
use seocrawl::domain::repositories::project_repository::ProjectRepository;
use seocrawl::domain::repositories::session_repository::RepositoryError;
use seocrawl::domain::services::issue_detector::IssueDetector;
use seocrawl::engines::browser_engine::BrowserEngine;
use seocrawl::engines::reqwest_engine::ReqwestEngine;
use seocrawl::engines::router::FetchRouter;
use seocrawl::engines::traits::FetchEngine;
use seocrawl::infrastructure::database::connection;
use seocrawl::infrastructure::metrics;
use seocrawl::infrastructure::repositories::memory_store::MemoryStore;
use seocrawl::infrastructure::repositories::Repositories;
use seocrawl::presentation::routes::{self, ApiDeps};
use seocrawl::utils::robots::RobotsChecker;
use seocrawl::utils::telemetry;
use seocrawl::workers::crawl_worker::WorkerDeps;
use seocrawl::workers::WorkerPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.telemetry);
    info!("Starting seocrawl...");
    metrics::init_metrics(&settings.metrics);

    // 3. Persistence
    let repos = match settings.persistence.backend {
        PersistenceBackend::Postgres => {
            let db = connection::connect_and_migrate(&settings.database).await?;
            Repositories::database(Arc::new(db))
        }
        PersistenceBackend::Memory => {
            warn!("Using in-memory persistence; crawl data is lost on exit");
            Repositories::memory(Arc::new(MemoryStore::new()))
        }
    };
    seed_projects(repos.projects.as_ref(), &settings.persistence.seed_projects).await?;

    // 4. Engines
    let plain = Arc::new(ReqwestEngine::new(&settings.crawler.user_agent)?);
    let browser = Arc::new(BrowserEngine::new(
        plain.clone(),
        settings.crawler.browser_remote_url.clone(),
    ));
    let engines: Vec<Arc<dyn FetchEngine>> = vec![plain, browser];
    let router = Arc::new(FetchRouter::new(engines));
    info!(engines = ?router.engine_names(), "Fetch engines registered");

    let robots_client = Client::builder()
        .user_agent(settings.crawler.user_agent.clone())
        .timeout(settings.crawler.request_timeout())
        .build()?;

    // 5. Workers and session manager
    let pool = Arc::new(WorkerPool::new(WorkerDeps {
        fetcher: router,
        robots: Arc::new(RobotsChecker::new(robots_client)),
        pages: repos.pages.clone(),
        detector: Arc::new(IssueDetector::new()),
        settings: settings.crawler.clone(),
    }));
    let manager = Arc::new(SessionManager::new(
        repos.projects.clone(),
        repos.sessions.clone(),
        repos.queue_items.clone(),
        pool.clone(),
        settings.crawler.clone(),
    ));

    // 6. Start HTTP server
    let app = routes::routes(ApiDeps {
        manager,
        pages: repos.pages.clone(),
        issues: repos.issues.clone(),
        analytics: repos.analytics.clone(),
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.shutdown();
    Ok(())
}

/// 写入配置中的项目，已存在的跳过
async fn seed_projects(
    projects: &dyn ProjectRepository,
    seeds: &[SeedProject],
) -> anyhow::Result<()> {
    for seed in seeds {
        let mut project = Project::new(seed.name.clone(), seed.domain.clone());
        if let Some(id) = seed.id {
            project.id = id;
        }
        match projects.create(&project).await {
            Ok(project) => info!(project_id = %project.id, domain = %project.domain, "Project seeded"),
            Err(RepositoryError::Conflict(_)) => {
                info!(project_id = %project.id, "Project already present")
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
