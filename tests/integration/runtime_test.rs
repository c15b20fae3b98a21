// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{crawler_settings, fast_config, harness_with, FakeRobots, FakeSite, SITE};
use async_trait::async_trait;
use parking_lot::Mutex;
use seocrawl::application::errors::SessionError;
use seocrawl::application::session_manager::{SessionManager, WorkerLauncher};
use seocrawl::application::session_runtime::{Claim, SessionRuntime};
use seocrawl::domain::models::project::Project;
use seocrawl::domain::models::queue_item::{QueueItem, QueueItemStatus};
use seocrawl::domain::models::session::{CrawlConfig, SessionStatus};
use seocrawl::domain::repositories::project_repository::ProjectRepository;
use seocrawl::domain::repositories::queue_item_repository::QueueItemRepository;
use seocrawl::domain::repositories::session_repository::{RepositoryError, SessionRepository};
use seocrawl::domain::services::progress_estimator::Estimate;
use seocrawl::infrastructure::repositories::memory_store::MemoryStore;
use seocrawl::infrastructure::repositories::Repositories;
use seocrawl::queue::queue_store::{FailOutcome, QueueError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// 只记录调用、不启动工作器的启动器，测试直接驱动运行时
#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<Uuid>>,
}

impl WorkerLauncher for RecordingLauncher {
    fn launch(&self, runtime: Arc<SessionRuntime>, _project: Project) {
        self.launched.lock().push(runtime.session_id());
    }
}

struct Manual {
    repos: Repositories,
    manager: SessionManager,
    launcher: Arc<RecordingLauncher>,
    project: Project,
}

async fn manual() -> Manual {
    manual_with_domain(SITE).await
}

async fn manual_with_domain(domain: &str) -> Manual {
    let repos = Repositories::memory(Arc::new(MemoryStore::new()));
    let launcher = Arc::new(RecordingLauncher::default());
    let manager = SessionManager::new(
        repos.projects.clone(),
        repos.sessions.clone(),
        repos.queue_items.clone(),
        launcher.clone(),
        crawler_settings(1),
    );
    let project = Project::new("Manual", domain);
    repos.projects.create(&project).await.unwrap();
    Manual {
        repos,
        manager,
        launcher,
        project,
    }
}

async fn claim_item(runtime: &SessionRuntime) -> QueueItem {
    match runtime.claim().await.unwrap() {
        Claim::Item(item) => item,
        other => panic!("expected an item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let m = manual().await;

    for config in [
        CrawlConfig {
            max_urls: 0,
            ..CrawlConfig::default()
        },
        CrawlConfig {
            max_depth: -1,
            ..CrawlConfig::default()
        },
        CrawlConfig {
            delay: -0.5,
            ..CrawlConfig::default()
        },
        CrawlConfig {
            exclude_patterns: vec!["re:([".to_string()],
            ..CrawlConfig::default()
        },
    ] {
        let err = m
            .manager
            .create_session(m.project.id, config)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)), "{:?}", err);
    }

    // Nothing was persisted
    assert!(m
        .repos
        .sessions
        .find_active_by_project(m.project.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unknown_project_and_session() {
    let m = manual().await;

    let err = m
        .manager
        .create_session(Uuid::new_v4(), CrawlConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ProjectNotFound));

    let missing = Uuid::new_v4();
    assert!(matches!(
        m.manager.get(missing).await.unwrap_err(),
        SessionError::NotFound
    ));
    assert!(matches!(
        m.manager.stop(missing).await.unwrap_err(),
        SessionError::NotFound
    ));
    assert!(matches!(
        m.manager.start(missing).await.unwrap_err(),
        SessionError::NotFound
    ));
}

#[tokio::test]
async fn test_one_active_session_per_project() {
    let m = manual().await;

    let first = m
        .manager
        .create_session(m.project.id, CrawlConfig::default())
        .await
        .unwrap();
    assert_eq!(first.status, SessionStatus::Pending);
    assert_eq!(first.crawled_urls, 0);
    assert_eq!(first.total_urls, None);

    let err = m
        .manager
        .create_session(m.project.id, CrawlConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Conflict(_)));

    // Another project is unaffected
    let other = Project::new("Other", "other.test");
    m.repos.projects.create(&other).await.unwrap();
    assert!(m
        .manager
        .create_session(other.id, CrawlConfig::default())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let m = manual().await;
    let session = m
        .manager
        .create_session(m.project.id, fast_config(10, 1))
        .await
        .unwrap();

    let started = m.manager.start(session.id).await.unwrap();
    assert_eq!(started.status, SessionStatus::Running);
    assert_eq!(*m.launcher.launched.lock(), vec![session.id]);

    let err = m.manager.start(session.id).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyStarted));
    assert_eq!(m.launcher.launched.lock().len(), 1);
}

#[tokio::test]
async fn test_stop_before_start_is_invalid() {
    let m = manual().await;
    let session = m
        .manager
        .create_session(m.project.id, CrawlConfig::default())
        .await
        .unwrap();

    let err = m.manager.stop(session.id).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidState(_)));
    assert_eq!(
        m.manager.get(session.id).await.unwrap().status,
        SessionStatus::Pending
    );
}

#[tokio::test]
async fn test_stop_without_in_flight_cancels_immediately() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    let runtime = m.manager.runtime(session.id).unwrap();

    let stopped = m.manager.stop(session.id).await.unwrap();
    assert_eq!(stopped.status, SessionStatus::Cancelled);
    assert!(stopped.completed_at.is_some());
    assert!(matches!(runtime.claim().await.unwrap(), Claim::Finished));

    let items = m.repos.queue_items.find_by_session(session.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, QueueItemStatus::Cancelled);

    // Stopping a terminal session returns it unchanged
    let again = m.manager.stop(session.id).await.unwrap();
    assert_eq!(again.status, SessionStatus::Cancelled);
    assert_eq!(again.completed_at, stopped.completed_at);
}

#[tokio::test]
async fn test_malformed_domain_fails_session() {
    let m = manual_with_domain("not a valid host!").await;
    let session = m
        .manager
        .create_session(m.project.id, CrawlConfig::default())
        .await
        .unwrap();

    let err = m.manager.start(session.id).await.unwrap_err();
    assert!(matches!(err, SessionError::FatalSeed(_)));
    assert!(m.launcher.launched.lock().is_empty());

    let failed = m.manager.get(session.id).await.unwrap();
    assert_eq!(failed.status, SessionStatus::Failed);
    assert!(failed.error_message.unwrap().contains("not a valid host!"));

    let stored = m
        .repos
        .sessions
        .find_by_id(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SessionStatus::Failed);
}

#[tokio::test]
async fn test_root_failure_abandons_session() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    let runtime = m.manager.runtime(session.id).unwrap();

    let root = claim_item(&runtime).await;
    assert_eq!(root.depth, 0);
    assert_eq!(root.url, format!("{}/", SITE));

    let outcome = runtime.fail(root.id, false, "connection refused").await.unwrap();
    assert!(matches!(outcome, FailOutcome::Failed(_)));

    let failed = runtime.snapshot().await;
    assert_eq!(failed.status, SessionStatus::Failed);
    assert_eq!(failed.failed_urls, 1);
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_retryable_failure_returns_item_to_queue() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    let runtime = m.manager.runtime(session.id).unwrap();

    let root = claim_item(&runtime).await;
    assert_eq!(root.attempt_count, 1);
    assert!(matches!(
        runtime.fail(root.id, true, "timeout").await.unwrap(),
        FailOutcome::Retried(_)
    ));
    assert_eq!(runtime.snapshot().await.status, SessionStatus::Running);

    let retried = claim_item(&runtime).await;
    assert_eq!(retried.id, root.id);
    assert_eq!(retried.attempt_count, 2);

    runtime.complete(retried.id, &[]).await.unwrap();
    let done = runtime.snapshot().await;
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.crawled_urls, 1);
    assert_eq!(done.failed_urls, 0);
}

#[tokio::test]
async fn test_complete_rejects_unknown_and_settled_items() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    let runtime = m.manager.runtime(session.id).unwrap();

    let unknown = Uuid::new_v4();
    let err = runtime.complete(unknown, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Queue(QueueError::UnknownItem(id)) if id == unknown
    ));

    let root = claim_item(&runtime).await;
    runtime
        .complete(root.id, &[format!("{}/a", SITE)])
        .await
        .unwrap();
    let err = runtime.complete(root.id, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Queue(QueueError::InvalidTransition { .. })
    ));
    assert_eq!(runtime.snapshot().await.crawled_urls, 1);
}

/// total_urls 在前沿关闭前未知，关闭后等于已完成数加未完成数
#[tokio::test]
async fn test_total_urls_becomes_known_when_frontier_closes() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(100, 1)).await.unwrap();
    assert_eq!(session.total_urls, None);
    let runtime = m.manager.runtime(session.id).unwrap();

    let root = claim_item(&runtime).await;
    let accepted = runtime
        .complete(
            root.id,
            &[
                format!("{}/a", SITE),
                format!("{}/b", SITE),
                format!("{}/a#section", SITE),
                "not a url".to_string(),
            ],
        )
        .await
        .unwrap();
    assert_eq!(accepted, 2);
    assert_eq!(runtime.snapshot().await.total_urls, Some(3));

    let progress = m.manager.progress(session.id).await.unwrap();
    assert_eq!(progress.crawled_urls, 1);
    assert_eq!(progress.total_urls, Some(3));
    let pct = progress.progress.percentage.value().unwrap();
    assert!((pct - 100.0 / 3.0).abs() < 1e-9);

    let a = claim_item(&runtime).await;
    // Depth 2 is past the limit
    let accepted = runtime
        .complete(a.id, &[format!("{}/c", SITE)])
        .await
        .unwrap();
    assert_eq!(accepted, 0);
    assert_eq!(runtime.snapshot().await.total_urls, Some(3));

    let b = claim_item(&runtime).await;
    runtime.fail(b.id, false, "gone").await.unwrap();

    let done = runtime.snapshot().await;
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.crawled_urls, 2);
    assert_eq!(done.failed_urls, 1);
    assert_eq!(done.total_urls, Some(2));

    let progress = m.manager.progress(session.id).await.unwrap();
    assert_eq!(progress.progress.percentage, Estimate::Known(100.0));
}

/// 尚未开始爬取时进度未知
#[tokio::test]
async fn test_progress_unknown_before_any_page() {
    let m = manual().await;
    let session = m.manager.launch(m.project.id, fast_config(10, 2)).await.unwrap();

    let progress = m.manager.progress(session.id).await.unwrap();
    assert_eq!(progress.status, SessionStatus::Running);
    assert_eq!(progress.progress.percentage, Estimate::Unknown);
    assert_eq!(progress.progress.remaining_seconds, Estimate::Unknown);
}

/// 根URL被排除规则拒绝时会话直接完成，进度为 100%
#[tokio::test]
async fn test_rejected_root_completes_with_full_progress() {
    let m = manual().await;
    let config = CrawlConfig {
        exclude_patterns: vec!["site.test".to_string()],
        ..fast_config(10, 1)
    };
    let session = m.manager.launch(m.project.id, config).await.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.total_urls, Some(0));
    assert!(m.launcher.launched.lock().is_empty());

    let progress = m.manager.progress(session.id).await.unwrap();
    assert_eq!(progress.progress.percentage, Estimate::Known(100.0));
    assert_eq!(progress.progress.remaining_seconds, Estimate::Known(0.0));
}

/// 工作器池在真实会话上跑完后从注册表移除
#[tokio::test]
async fn test_pool_forgets_finished_sessions() {
    let site = Arc::new(FakeSite::new());
    let h = harness_with(site, Arc::new(FakeRobots::default()), 2, SITE).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(5, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    // An unknown root answers 404, which still counts as crawled
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 1);

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while h.pool.active_sessions() > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

/// 写入会失败的队列项仓库
///
/// `update` 对第一个 completed 项返回一次错误；`insert` 可整体关闭。
struct FlakyQueueItems {
    inner: Arc<MemoryStore>,
    fail_completed_update: AtomicBool,
    fail_inserts: bool,
}

impl FlakyQueueItems {
    fn new(inner: Arc<MemoryStore>, fail_inserts: bool) -> Self {
        Self {
            inner,
            fail_completed_update: AtomicBool::new(true),
            fail_inserts,
        }
    }
}

#[async_trait]
impl QueueItemRepository for FlakyQueueItems {
    async fn insert(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        if self.fail_inserts {
            return Err(RepositoryError::Conflict("insert rejected".to_string()));
        }
        QueueItemRepository::insert(self.inner.as_ref(), item).await
    }

    async fn update(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        if item.status == QueueItemStatus::Completed
            && self.fail_completed_update.swap(false, Ordering::SeqCst)
        {
            return Err(RepositoryError::NotFound);
        }
        QueueItemRepository::update(self.inner.as_ref(), item).await
    }

    async fn cancel_pending(&self, session_id: Uuid) -> Result<u64, RepositoryError> {
        QueueItemRepository::cancel_pending(self.inner.as_ref(), session_id).await
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<QueueItem>, RepositoryError> {
        QueueItemRepository::find_by_session(self.inner.as_ref(), session_id).await
    }
}

async fn manual_with_flaky_queue(fail_inserts: bool) -> Manual {
    let store = Arc::new(MemoryStore::new());
    let mut repos = Repositories::memory(store.clone());
    repos.queue_items = Arc::new(FlakyQueueItems::new(store, fail_inserts));
    let launcher = Arc::new(RecordingLauncher::default());
    let manager = SessionManager::new(
        repos.projects.clone(),
        repos.sessions.clone(),
        repos.queue_items.clone(),
        launcher.clone(),
        crawler_settings(1),
    );
    let project = Project::new("Manual", SITE);
    repos.projects.create(&project).await.unwrap();
    Manual {
        repos,
        manager,
        launcher,
        project,
    }
}

/// 最后一项的写入失败不影响会话进入终态
#[tokio::test]
async fn test_write_failure_on_last_item_still_completes_session() {
    let m = manual_with_flaky_queue(false).await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    let runtime = m.manager.runtime(session.id).unwrap();

    let root = claim_item(&runtime).await;
    assert_eq!(runtime.complete(root.id, &[]).await.unwrap(), 0);
    assert!(matches!(runtime.claim().await.unwrap(), Claim::Finished));

    let finished = tokio::time::timeout(Duration::from_secs(5), runtime.wait_finished())
        .await
        .unwrap();
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 1);

    let stored = m.repos.sessions.find_by_id(session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(m
        .repos
        .sessions
        .find_active_by_project(m.project.id)
        .await
        .unwrap()
        .is_none());

    // The project can be crawled again
    assert!(m
        .manager
        .create_session(m.project.id, fast_config(10, 1))
        .await
        .is_ok());
}

/// 种子写入失败时会话照常启动并跑完
#[tokio::test]
async fn test_seed_insert_failure_still_launches_workers() {
    let m = manual_with_flaky_queue(true).await;
    let session = m.manager.launch(m.project.id, fast_config(10, 1)).await.unwrap();
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(*m.launcher.launched.lock(), vec![session.id]);

    let runtime = m.manager.runtime(session.id).unwrap();
    let root = claim_item(&runtime).await;
    let accepted = runtime
        .complete(root.id, &[format!("{}/a", SITE)])
        .await
        .unwrap();
    assert_eq!(accepted, 1);

    let a = claim_item(&runtime).await;
    runtime.complete(a.id, &[]).await.unwrap();

    let done = runtime.snapshot().await;
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.crawled_urls, 2);
    assert!(m.repos.queue_items.find_by_session(session.id).await.unwrap().is_empty());
}

/// 会话结束后运行时移出注册表，查询改读仓库
#[tokio::test]
async fn test_finished_sessions_leave_registry() {
    let site = Arc::new(FakeSite::new());
    let h = harness_with(site, Arc::new(FakeRobots::default()), 2, SITE).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(5, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.manager.tracked_sessions() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(matches!(
        h.manager.runtime(session.id).unwrap_err(),
        SessionError::NotFound
    ));
    let stored = h.manager.get(session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.crawled_urls, finished.crawled_urls);
    assert_eq!(
        h.manager.wait_finished(session.id).await.unwrap().status,
        SessionStatus::Completed
    );

    let (snapshot, mut receiver) = h.manager.subscribe(session.id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert!(matches!(receiver.recv().await, Err(RecvError::Closed)));

    let progress = h.manager.progress(session.id).await.unwrap();
    assert_eq!(progress.progress.percentage, Estimate::Known(100.0));
}
