// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 纯计算服务，不持有可变共享状态：
/// - 页面提取（page_extractor）：HTML → 页面事实
/// - 文本指标（text_metrics）：易读性与关键词密度
/// - 链接发现（link_discoverer）：出站链接及站内外分类
/// - 问题检测（issue_detector）：规则注册表
/// - 汇总（aggregator）：基于快照的会话统计
/// - 进度估算（progress_estimator）
pub mod aggregator;
pub mod issue_detector;
pub mod link_discoverer;
pub mod page_extractor;
pub mod progress_estimator;
pub mod text_metrics;
