// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_config, harness_with, html_page, Harness};
use seocrawl::domain::models::session::SessionStatus;
use seocrawl::engines::reqwest_engine::ReqwestEngine;
use seocrawl::utils::robots::RobotsChecker;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// 本地 HTTP 站点：首页、子页面、robots 禁止的页面、PDF 与重定向
async fn fixture_site() -> MockServer {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        200,
        html_page(
            "Fixture home page for the crawler",
            &["/about", "/private/area", "/files/guide.pdf", "/old", "https://external.test/"],
        ),
    )
    .await;
    mount_html(&server, "/about", 200, html_page("About us", &["/"])).await;
    mount_html(&server, "/private/area", 200, html_page("Private", &[])).await;

    Mock::given(method("GET"))
        .and(path("/files/guide.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4".to_vec()),
        )
        .mount(&server)
        .await;

    let location = format!("{}/about", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", location.as_str()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private/\n"),
        )
        .mount(&server)
        .await;

    server
}

async fn real_harness(server: &MockServer) -> Harness {
    let engine = ReqwestEngine::new("seocrawl-bot/1.0").unwrap();
    harness_with(
        Arc::new(engine),
        Arc::new(RobotsChecker::default()),
        2,
        &server.uri(),
    )
    .await
}

#[tokio::test]
async fn test_crawl_local_site_end_to_end() {
    let server = fixture_site().await;
    let h = real_harness(&server).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(20, 2))
        .await
        .unwrap();
    let finished = h.finish(&session).await;

    assert_eq!(finished.status, SessionStatus::Completed);
    // Home, about, pdf and the redirect; the private page is disallowed
    assert_eq!(finished.crawled_urls, 4);
    assert_eq!(finished.failed_urls, 1);

    let pages = h.store.pages_of(session.id);
    assert!(pages.iter().all(|p| !p.url.contains("/private/")));
    assert!(pages.iter().all(|p| !p.url.contains("external.test")));

    let home = pages.iter().find(|p| p.depth == 0).unwrap();
    assert_eq!(home.status_code, Some(200));
    assert_eq!(home.title.as_deref(), Some("Fixture home page for the crawler"));

    let links = h.repos.pages.find_links_from(home.id).await.unwrap();
    assert!(links.iter().any(|l| l.to_url == "https://external.test/"));
    assert!(links.len() >= 5);
}

/// 非 HTML 响应保存为页面，但不做分析
#[tokio::test]
async fn test_non_html_response_is_stored_without_issues() {
    let server = fixture_site().await;
    let h = real_harness(&server).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(20, 1))
        .await
        .unwrap();
    h.finish(&session).await;

    let pdf = h
        .store
        .pages_of(session.id)
        .into_iter()
        .find(|p| p.url.ends_with("/files/guide.pdf"))
        .unwrap();
    assert_eq!(pdf.status_code, Some(200));
    assert!(h.repos.issues.list_by_page(pdf.id).await.unwrap().is_empty());
    assert!(h.repos.pages.find_links_from(pdf.id).await.unwrap().is_empty());
}

/// 跟随重定向时记录最终URL
#[tokio::test]
async fn test_redirect_records_final_url() {
    let server = fixture_site().await;
    let h = real_harness(&server).await;

    let session = h
        .manager
        .launch(h.project.id, fast_config(20, 1))
        .await
        .unwrap();
    h.finish(&session).await;

    let old = h
        .store
        .pages_of(session.id)
        .into_iter()
        .find(|p| p.url.ends_with("/old"))
        .unwrap();
    assert_eq!(old.status_code, Some(200));
    assert_eq!(
        old.meta.final_url.as_deref(),
        Some(format!("{}/about", server.uri()).as_str())
    );
}

/// robots.txt 被忽略时，禁止的页面照常爬取
#[tokio::test]
async fn test_robots_can_be_ignored() {
    let server = fixture_site().await;
    let h = real_harness(&server).await;

    let mut config = fast_config(20, 1);
    config.respect_robots = false;
    let session = h.manager.launch(h.project.id, config).await.unwrap();
    let finished = h.finish(&session).await;

    assert_eq!(finished.crawled_urls, 5);
    assert_eq!(finished.failed_urls, 0);
}
