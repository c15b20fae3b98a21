// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{harness, html_page, FakeSite, Harness};
use axum::http::StatusCode;
use axum_test::TestServer;
use seocrawl::presentation::routes::{routes, ApiDeps};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn site() -> FakeSite {
    FakeSite::new()
        .page("/", html_page("Home", &["/a", "/b"]))
        .page("/a", html_page("A", &[]))
        .status_page("/b", 500, "<html><body>oops</body></html>".to_string())
}

async fn test_app(site: FakeSite) -> (TestServer, Harness) {
    let h = harness(Arc::new(site), 2).await;
    let app = routes(ApiDeps {
        manager: h.manager.clone(),
        pages: h.repos.pages.clone(),
        issues: h.repos.issues.clone(),
        analytics: h.repos.analytics.clone(),
    });
    (TestServer::new(app).unwrap(), h)
}

/// 通过接口启动会话并等待其结束
async fn crawl(server: &TestServer, h: &Harness) -> Uuid {
    let response = server
        .post(&format!("/api/projects/{}/crawls", h.project.id))
        .json(&json!({ "max_urls": 10, "max_depth": 1, "delay": 0 }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["status"], "running");
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let session = h.manager.get(id).await.unwrap();
    h.finish(&session).await;
    id
}

#[tokio::test]
async fn test_health_and_version() {
    let (server, _h) = test_app(site()).await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");

    server.get("/api/version").await.assert_status_ok();
}

#[tokio::test]
async fn test_create_crawl_validates_input() {
    let (server, h) = test_app(site()).await;

    let response = server
        .post(&format!("/api/projects/{}/crawls", h.project.id))
        .json(&json!({ "max_urls": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post(&format!("/api/projects/{}/crawls", h.project.id))
        .json(&json!({ "exclude_patterns": ["re:(["] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("exclude pattern"));

    server
        .post(&format!("/api/projects/{}/crawls", Uuid::new_v4()))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_active_session_conflicts() {
    let gated = site().gated("/");
    let (server, h) = test_app(gated).await;

    let path = format!("/api/projects/{}/crawls", h.project.id);
    server
        .post(&path)
        .json(&json!({ "delay": 0 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.post(&path).json(&json!({ "delay": 0 })).await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_session_lifecycle_endpoints() {
    let (server, h) = test_app(site()).await;
    let id = crawl(&server, &h).await;

    let body: Value = server.get(&format!("/api/crawls/{}", id)).await.json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["crawled_urls"], 3);
    assert_eq!(body["total_urls"], 3);

    let progress: Value = server
        .get(&format!("/api/crawls/{}/progress", id))
        .await
        .json();
    assert_eq!(progress["percentage"], 100.0);
    assert_eq!(progress["status"], "completed");

    // Stopping a finished session is a no-op
    let stopped: Value = server
        .post(&format!("/api/crawls/{}/stop", id))
        .await
        .json();
    assert_eq!(stopped["status"], "completed");

    server
        .get(&format!("/api/crawls/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_reports_unknown_before_estimate() {
    let (server, h) = test_app(site().gated("/")).await;

    let response = server
        .post(&format!("/api/projects/{}/crawls", h.project.id))
        .json(&json!({ "delay": 0 }))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let progress: Value = server
        .get(&format!("/api/crawls/{}/progress", id))
        .await
        .json();
    assert_eq!(progress["percentage"], "unknown");
    assert_eq!(progress["remaining_seconds"], "unknown");
    assert!(progress["total_urls"].is_null());
}

#[tokio::test]
async fn test_pages_and_page_detail() {
    let (server, h) = test_app(site()).await;
    let id = crawl(&server, &h).await;

    let pages: Value = server
        .get(&format!("/api/crawls/{}/pages", id))
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(pages["total"], 3);
    assert_eq!(pages["limit"], 2);
    assert_eq!(pages["items"].as_array().unwrap().len(), 2);

    let home = h
        .store
        .pages_of(id)
        .into_iter()
        .find(|p| p.depth == 0)
        .unwrap();
    let detail: Value = server
        .get(&format!("/api/pages/{}", home.id))
        .await
        .json();
    assert_eq!(detail["url"], "https://site.test/");
    assert_eq!(detail["links"].as_array().unwrap().len(), 2);
    assert!(detail["issues"].is_array());

    server
        .get(&format!("/api/pages/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/crawls/{}/pages", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/crawls/{}/pages", id))
        .add_query_param("limit", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_filters_and_summary() {
    let (server, h) = test_app(site()).await;
    let id = crawl(&server, &h).await;

    let all: Value = server
        .get(&format!("/api/crawls/{}/issues", id))
        .await
        .json();
    let total = all["total"].as_u64().unwrap();
    assert!(total > 0);

    let critical: Value = server
        .get(&format!("/api/crawls/{}/issues", id))
        .add_query_param("severity", "critical")
        .add_query_param("category", "technical")
        .await
        .json();
    let items = critical["items"].as_array().unwrap();
    assert!(items.iter().any(|i| i["issue_type"] == "server_error"));
    assert!(items
        .iter()
        .all(|i| i["severity"] == "critical" && i["category"] == "technical"));

    // Highest impact first
    let scores: Vec<i64> = all["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["impact_score"].as_i64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    let summary: Value = server
        .get(&format!("/api/crawls/{}/summary", id))
        .await
        .json();
    assert_eq!(summary["total_pages"], 3);
    assert_eq!(summary["total_issues"].as_u64().unwrap(), total);
    assert_eq!(summary["status_codes"]["2xx"], 2);
    assert_eq!(summary["status_codes"]["4xx+"], 1);
    let by_severity: u64 = summary["issues_by_severity"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(by_severity, total);

    server
        .get(&format!("/api/crawls/{}/issues", id))
        .add_query_param("severity", "catastrophic")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
