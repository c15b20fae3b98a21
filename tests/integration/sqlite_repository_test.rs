// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{crawler_settings, fast_config, html_page, FakeRobots, FakeSite, SITE};
use seocrawl::application::session_manager::SessionManager;
use seocrawl::config::settings::DatabaseSettings;
use seocrawl::domain::models::project::Project;
use seocrawl::domain::models::queue_item::{QueueItem, QueueItemStatus};
use seocrawl::domain::models::session::SessionStatus;
use seocrawl::domain::repositories::issue_repository::IssueQuery;
use seocrawl::domain::repositories::session_repository::RepositoryError;
use seocrawl::domain::services::aggregator::Aggregator;
use seocrawl::domain::services::issue_detector::IssueDetector;
use seocrawl::infrastructure::database::connection;
use seocrawl::infrastructure::repositories::Repositories;
use seocrawl::workers::crawl_worker::WorkerDeps;
use seocrawl::workers::WorkerPool;
use std::sync::Arc;
use std::time::Duration;

async fn sqlite_repositories() -> Repositories {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: Some(10),
        idle_timeout: None,
    };
    let db = connection::connect_and_migrate(&settings).await.unwrap();
    Repositories::database(Arc::new(db))
}

#[tokio::test]
async fn test_project_insert_conflict() {
    let repos = sqlite_repositories().await;
    let project = Project::new("Fixture", SITE);

    let created = repos.projects.create(&project).await.unwrap();
    assert_eq!(created.id, project.id);
    let found = repos.projects.find_by_id(project.id).await.unwrap().unwrap();
    assert_eq!(found.domain, SITE);

    let err = repos.projects.create(&project).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_queue_item_url_is_unique_per_session() {
    let repos = sqlite_repositories().await;
    let project = Project::new("Fixture", SITE);
    repos.projects.create(&project).await.unwrap();
    let session = repos
        .sessions
        .create(&seocrawl::domain::models::session::CrawlSession::new(
            project.id,
            fast_config(10, 1),
        ))
        .await
        .unwrap();

    let url = format!("{}/", SITE);
    let item = QueueItem::new(session.id, url.clone(), 0, None, 0);
    repos.queue_items.insert(&item).await.unwrap();

    let duplicate = QueueItem::new(session.id, url, 0, None, 1);
    let err = repos.queue_items.insert(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    assert_eq!(repos.queue_items.cancel_pending(session.id).await.unwrap(), 1);
    let items = repos.queue_items.find_by_session(session.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, QueueItemStatus::Cancelled);
}

/// 数据库后端上的完整爬取
#[tokio::test]
async fn test_crawl_persists_through_sea_orm() {
    let repos = sqlite_repositories().await;
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/a", "/b"]))
            .page("/a", html_page("A", &["/"]))
            .status_page("/b", 404, String::new()),
    );
    let settings = crawler_settings(2);
    let pool = Arc::new(WorkerPool::new(WorkerDeps {
        fetcher: site,
        robots: Arc::new(FakeRobots::default()),
        pages: repos.pages.clone(),
        detector: Arc::new(IssueDetector::new()),
        settings: settings.clone(),
    }));
    let manager = SessionManager::new(
        repos.projects.clone(),
        repos.sessions.clone(),
        repos.queue_items.clone(),
        pool,
        settings,
    );
    let project = Project::new("Fixture", SITE);
    repos.projects.create(&project).await.unwrap();

    let session = manager.launch(project.id, fast_config(10, 1)).await.unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(10), manager.wait_finished(session.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 3);

    let stored = repos
        .sessions
        .find_by_id(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.crawled_urls, 3);
    assert_eq!(stored.total_urls, Some(3));
    assert_eq!(stored.config, fast_config(10, 1));
    assert!(repos
        .sessions
        .find_active_by_project(project.id)
        .await
        .unwrap()
        .is_none());

    let items = repos.queue_items.find_by_session(session.id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].depth, 0);
    assert!(items.iter().all(|i| i.status == QueueItemStatus::Completed));

    let (pages, total) = repos.pages.list_by_session(session.id, 0, 2).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(pages.len(), 2);

    let (issues, issue_total) = repos
        .issues
        .list_by_session(&IssueQuery {
            session_id: session.id,
            severity: None,
            category: None,
            offset: 0,
            limit: 1000,
        })
        .await
        .unwrap();
    assert_eq!(issues.len() as u64, issue_total);
    assert!(issues.iter().any(|i| i.issue_type == "client_error"));

    let summary = Aggregator::new(repos.analytics.clone())
        .summarize(session.id, 0)
        .await
        .unwrap();
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.total_issues, issue_total);
    assert_eq!(summary.status_codes.get("4xx+"), Some(&1));
}
