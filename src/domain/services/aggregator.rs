// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::issue::Severity;
use crate::domain::models::summary::{SessionSnapshot, SessionSummary};
use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::repositories::session_repository::RepositoryError;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// 状态码分桶
pub fn status_bucket(status_code: Option<i32>) -> &'static str {
    match status_code {
        Some(code) if (200..300).contains(&code) => "2xx",
        Some(code) if (300..400).contains(&code) => "3xx",
        Some(code) if code >= 400 => "4xx+",
        _ => "other",
    }
}

/// 从快照计算会话汇总
///
/// 纯函数：结果只取决于快照内容。
pub fn summarize_snapshot(
    session_id: Uuid,
    failed_pages: u64,
    snapshot: &SessionSnapshot,
) -> SessionSummary {
    let mut status_codes = BTreeMap::new();
    let mut load_time_sum = 0.0;
    let mut word_count_sum = 0i64;
    let mut word_count_pages = 0u64;

    for page in &snapshot.pages {
        *status_codes
            .entry(status_bucket(page.status_code).to_string())
            .or_insert(0u64) += 1;
        load_time_sum += page.load_time;
        if let Some(words) = page.word_count {
            word_count_sum += words as i64;
            word_count_pages += 1;
        }
    }

    let mut issues_by_severity: BTreeMap<Severity, u64> =
        Severity::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut issues_by_category = BTreeMap::new();
    let mut pages_with_issues = HashSet::new();

    for issue in &snapshot.issues {
        *issues_by_severity.entry(issue.severity).or_insert(0) += 1;
        *issues_by_category.entry(issue.category).or_insert(0u64) += 1;
        pages_with_issues.insert(issue.page_id);
    }

    let total_pages = snapshot.pages.len() as u64;
    let avg_load_time = if total_pages == 0 {
        0.0
    } else {
        load_time_sum / total_pages as f64
    };
    let avg_word_count = if word_count_pages == 0 {
        0.0
    } else {
        word_count_sum as f64 / word_count_pages as f64
    };

    SessionSummary {
        session_id,
        total_pages,
        failed_pages,
        total_issues: snapshot.issues.len() as u64,
        pages_with_issues: pages_with_issues.len() as u64,
        status_codes,
        issues_by_severity,
        issues_by_category,
        avg_load_time,
        avg_word_count,
    }
}

/// 汇总服务
///
/// 对已提交的页面与问题做一次快照读取后计算汇总，不获取任何写入方的锁。
pub struct Aggregator<A: AnalyticsRepository + ?Sized> {
    analytics: Arc<A>,
}

impl<A: AnalyticsRepository + ?Sized> Aggregator<A> {
    pub fn new(analytics: Arc<A>) -> Self {
        Self { analytics }
    }

    /// 计算会话汇总
    ///
    /// # 参数
    ///
    /// * `session_id` - 会话ID
    /// * `failed_pages` - 会话的永久失败URL数
    pub async fn summarize(
        &self,
        session_id: Uuid,
        failed_pages: u64,
    ) -> Result<SessionSummary, RepositoryError> {
        let snapshot = self.analytics.snapshot(session_id).await?;
        Ok(summarize_snapshot(session_id, failed_pages, &snapshot))
    }
}
