// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_config, harness, harness_with, html_page, FakeRobots, FakeSite, SITE};
use seocrawl::domain::models::issue::{Category, Severity};
use seocrawl::domain::models::queue_item::QueueItemStatus;
use seocrawl::domain::models::session::SessionStatus;
use seocrawl::domain::repositories::queue_item_repository::QueueItemRepository;
use seocrawl::domain::repositories::issue_repository::IssueQuery;
use seocrawl::engines::traits::EngineError;
use std::sync::Arc;
use std::time::Duration;

/// 小站点完整爬取
///
/// 根页面链接三个子页面，上限5、深度1，应爬取4个页面并正常完成
#[tokio::test]
async fn test_small_site_completes() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/a", "/b", "/c"]))
            .page("/a", html_page("A", &["/deeper"]))
            .page("/b", html_page("B", &[]))
            .page("/c", html_page("C", &["/"])),
    );
    let h = harness(site.clone(), 2).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(5, 1))
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Running);

    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 4);
    assert_eq!(finished.failed_urls, 0);
    assert_eq!(finished.total_urls, Some(4));
    assert!(finished.completed_at.is_some());

    let mut urls: Vec<String> = h
        .store
        .pages_of(session.id)
        .into_iter()
        .map(|p| p.url)
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", SITE),
            format!("{}/a", SITE),
            format!("{}/b", SITE),
            format!("{}/c", SITE),
        ]
    );
    // Depth 2 links are never fetched
    assert!(!site.fetched().contains(&format!("{}/deeper", SITE)));
}

/// 错误页面
///
/// 404 页面仍被保存，只报告状态码问题，不报告缺失标题等内容问题
#[tokio::test]
async fn test_error_page_reports_status_issue_only() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/missing"]))
            .status_page("/missing", 404, "<html><body></body></html>".to_string()),
    );
    let h = harness(site, 1).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(10, 2))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 2);

    let missing = h
        .store
        .pages_of(session.id)
        .into_iter()
        .find(|p| p.url.ends_with("/missing"))
        .unwrap();
    assert_eq!(missing.status_code, Some(404));

    let issues = h.repos.issues.list_by_page(missing.id).await.unwrap();
    let types: Vec<&str> = issues.iter().map(|i| i.issue_type.as_str()).collect();
    assert!(types.contains(&"client_error"));
    assert!(!types.contains(&"missing_title"));
    assert!(!types.contains(&"thin_content"));
}

/// 请求停止
///
/// 两个处理中、三个待处理时停止：处理中的项完成后会话取消，其余项放弃
#[tokio::test]
async fn test_stop_lets_in_flight_items_finish() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/a", "/b", "/c", "/d", "/e"]))
            .page("/a", html_page("A", &[]))
            .page("/b", html_page("B", &[]))
            .gated("/a")
            .gated("/b"),
    );
    let h = harness(site.clone(), 2).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(20, 1))
        .await
        .unwrap();

    // Root plus the two gated fetches
    tokio::time::timeout(Duration::from_secs(5), async {
        while site.started() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let runtime = h.manager.runtime(session.id).unwrap();
    assert_eq!(runtime.in_flight().await, 2);

    let stopping = h.manager.stop(session.id).await.unwrap();
    assert_eq!(stopping.status, SessionStatus::Running);

    site.release(2);
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Cancelled);
    assert_eq!(finished.crawled_urls, 3);
    assert_eq!(h.store.pages_of(session.id).len(), 3);

    let items = runtime.queue_items().await;
    let cancelled = items
        .iter()
        .filter(|i| i.status == QueueItemStatus::Cancelled)
        .count();
    assert_eq!(cancelled, 3);
    assert!(items
        .iter()
        .all(|i| i.status != QueueItemStatus::Pending && i.status != QueueItemStatus::Processing));
    assert_eq!(site.started(), 3);
}

/// 空内容页面报告 thin_content
#[tokio::test]
async fn test_empty_page_is_thin_content() {
    let site = Arc::new(FakeSite::new().page(
        "/",
        "<html lang=\"en\"><head><title>Nothing here at all</title></head><body></body></html>"
            .to_string(),
    ));
    let h = harness(site, 1).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(5, 0))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 1);

    let page = &h.store.pages_of(session.id)[0];
    assert_eq!(page.word_count, Some(0));

    let issues = h.repos.issues.list_by_page(page.id).await.unwrap();
    let thin = issues
        .iter()
        .find(|i| i.issue_type == "thin_content")
        .unwrap();
    assert_eq!(thin.severity, Severity::Medium);
    assert_eq!(thin.category, Category::Content);
    assert!(!issues.iter().any(|i| i.issue_type == "low_word_count"));

    let (content, total) = h
        .repos
        .issues
        .list_by_session(&IssueQuery {
            session_id: session.id,
            severity: Some(Severity::Medium),
            category: Some(Category::Content),
            offset: 0,
            limit: 100,
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(content[0].issue_type, "thin_content");
}

/// robots.txt 禁止的URL计为永久失败，不保存页面
#[tokio::test]
async fn test_robots_disallowed_url_fails_without_page() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/private", "/public"]))
            .page("/private", html_page("Private", &[]))
            .page("/public", html_page("Public", &[])),
    );
    let h = harness_with(
        site.clone(),
        Arc::new(FakeRobots::disallow(&["/private"])),
        2,
        SITE,
    )
    .await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(10, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 2);
    assert_eq!(finished.failed_urls, 1);
    assert!(!site.fetched().contains(&format!("{}/private", SITE)));
    assert!(h
        .store
        .pages_of(session.id)
        .iter()
        .all(|p| !p.url.ends_with("/private")));
}

/// 不遵守 robots.txt 时照常抓取
#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/private"]))
            .page("/private", html_page("Private", &[])),
    );
    let h = harness_with(
        site.clone(),
        Arc::new(FakeRobots::disallow(&["/private"])),
        1,
        SITE,
    )
    .await;

    let mut config = fast_config(10, 1);
    config.respect_robots = false;
    let session = h.manager.launch(h.project.id, config).await.unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.crawled_urls, 2);
    assert_eq!(finished.failed_urls, 0);
}

/// 可重试错误在预算内重试，之后永久失败
#[tokio::test]
async fn test_retryable_failure_is_retried_then_failed() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/flaky"]))
            .failing("/flaky", || EngineError::Timeout),
    );
    let h = harness(site.clone(), 1).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(10, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Completed);
    assert_eq!(finished.crawled_urls, 1);
    assert_eq!(finished.failed_urls, 1);

    let flaky = format!("{}/flaky", SITE);
    // One attempt plus two retries
    let attempts = site.fetched().iter().filter(|u| **u == flaky).count();
    assert_eq!(attempts, 3);

    let items = h.repos.queue_items.find_by_session(session.id).await.unwrap();
    let item = items.iter().find(|i| i.url == flaky).unwrap();
    assert_eq!(item.status, QueueItemStatus::Failed);
    assert_eq!(item.attempt_count, 3);
}

/// 永久错误不重试
#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/broken"]))
            .failing("/broken", || EngineError::Other("unsupported scheme".into())),
    );
    let h = harness(site.clone(), 1).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(10, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.failed_urls, 1);

    let broken = format!("{}/broken", SITE);
    assert_eq!(site.fetched().iter().filter(|u| **u == broken).count(), 1);
}

/// 根URL永久失败使会话失败
#[tokio::test]
async fn test_root_failure_fails_session() {
    let site = Arc::new(FakeSite::new().failing("/", || EngineError::Other("refused".into())));
    let h = harness(site, 1).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(10, 1))
        .await
        .unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.status, SessionStatus::Failed);
    assert_eq!(finished.crawled_urls, 0);
    assert_eq!(finished.failed_urls, 1);
    assert!(finished
        .error_message
        .as_deref()
        .unwrap()
        .contains("Root URL"));
    assert!(h.store.pages_of(session.id).is_empty());
}

/// 排除规则生效
#[tokio::test]
async fn test_exclude_patterns_skip_urls() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", html_page("Home", &["/blog/post", "/shop"]))
            .page("/blog/post", html_page("Post", &[]))
            .page("/shop", html_page("Shop", &[])),
    );
    let h = harness(site.clone(), 1).await;

    let mut config = fast_config(10, 1);
    config.exclude_patterns = vec!["/blog/".to_string()];
    let session = h.manager.launch(h.project.id, config).await.unwrap();
    let finished = h.finish(&session).await;
    assert_eq!(finished.crawled_urls, 2);
    assert!(!site.fetched().iter().any(|u| u.contains("/blog/")));
}
