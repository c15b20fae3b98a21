// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// SEO问题实体
///
/// 问题检测器针对页面产生的一条结果。同一页面内 `issue_type` 唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// 问题唯一标识符
    pub id: Uuid,
    /// 所属页面ID
    pub page_id: Uuid,
    /// 所属会话ID
    pub session_id: Uuid,
    /// 问题类型键，例如 `missing_title`
    pub issue_type: String,
    /// 严重程度
    pub severity: Severity,
    /// 问题类别
    pub category: Category,
    /// 问题描述
    pub description: String,
    /// 修复建议
    pub recommendation: Option<String>,
    /// 影响分数，范围 [0, 100]
    pub impact_score: i32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 全部严重程度，按升序排列
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// 严重程度权重
    pub fn weight(self) -> i32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

/// 问题类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Content,
    Performance,
    Accessibility,
    Social,
    Security,
    Mobile,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Technical,
        Category::Content,
        Category::Performance,
        Category::Accessibility,
        Category::Social,
        Category::Security,
        Category::Mobile,
    ];

    /// 类别权重，technical 与 performance 高于其他类别
    pub fn weight(self) -> i32 {
        match self {
            Category::Technical | Category::Performance => 5,
            _ => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Category::Technical => "technical",
            Category::Content => "content",
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::Social => "social",
            Category::Security => "security",
            Category::Mobile => "mobile",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.to_string() == s)
            .ok_or(())
    }
}

/// 最大权重乘积（critical × technical），用于归一化
const MAX_WEIGHT_PRODUCT: i32 = 4 * 5;

/// 计算影响分数
///
/// `severity.weight() * category.weight()` 归一化到 [0, 100]。
pub fn impact_score(severity: Severity, category: Category) -> i32 {
    severity.weight() * category.weight() * 100 / MAX_WEIGHT_PRODUCT
}
