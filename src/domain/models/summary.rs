// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::issue::{Category, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 会话汇总
///
/// 派生数据，不持久化；每次读取时从快照重新计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// 已写入的页面数
    pub total_pages: u64,
    /// 重试耗尽的失败URL数
    pub failed_pages: u64,
    /// 问题总数
    pub total_issues: u64,
    /// 至少有一个问题的页面数
    pub pages_with_issues: u64,
    /// 状态码分桶：`2xx` / `3xx` / `4xx+` / `other`
    pub status_codes: BTreeMap<String, u64>,
    /// 按严重程度统计，四个键始终存在
    pub issues_by_severity: BTreeMap<Severity, u64>,
    /// 按类别统计
    pub issues_by_category: BTreeMap<Category, u64>,
    /// 平均加载耗时（秒）
    pub avg_load_time: f64,
    /// 平均词数（仅统计有词数的页面）
    pub avg_word_count: f64,
}

/// 快照中的页面事实
#[derive(Debug, Clone, PartialEq)]
pub struct PageFacts {
    pub page_id: Uuid,
    pub status_code: Option<i32>,
    pub load_time: f64,
    pub word_count: Option<i32>,
}

/// 快照中的问题事实
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFacts {
    pub page_id: Uuid,
    pub severity: Severity,
    pub category: Category,
}

/// 某一时刻已提交的页面与问题集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub pages: Vec<PageFacts>,
    pub issues: Vec<IssueFacts>,
}
