// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 成功抓取并分析的页面数
pub const PAGES_TOTAL: &str = "seocrawl_pages_total";
/// 抓取失败次数（按是否可重试打标签）
pub const FETCH_FAILURES_TOTAL: &str = "seocrawl_fetch_failures_total";
/// 检测到的问题数（按严重程度打标签）
pub const ISSUES_TOTAL: &str = "seocrawl_issues_total";
/// 单次抓取耗时
pub const FETCH_DURATION_SECONDS: &str = "seocrawl_fetch_duration_seconds";
/// 进入终态的会话数（按状态打标签）
pub const SESSIONS_TOTAL: &str = "seocrawl_sessions_total";

/// 初始化 Prometheus 指标导出
///
/// 未启用时不安装记录器，`metrics` 宏退化为空操作。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics listen address '{}': {}", settings.listen_addr, e);
            return;
        }
    };

    // The port may already be taken in development, which is not fatal
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(PAGES_TOTAL, "Pages fetched and analyzed");
    describe_counter!(FETCH_FAILURES_TOTAL, "Failed fetch attempts");
    describe_counter!(ISSUES_TOTAL, "SEO issues detected");
    describe_counter!(SESSIONS_TOTAL, "Crawl sessions that reached a terminal state");
    describe_histogram!(FETCH_DURATION_SECONDS, Unit::Seconds, "Page fetch duration");
}
