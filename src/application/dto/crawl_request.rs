// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::session::CrawlConfig;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 启动爬取请求DTO
///
/// 所有字段可选，缺省值与 [`CrawlConfig::default`] 一致。
#[derive(Debug, Default, Deserialize, Serialize, Validate, Clone)]
pub struct CrawlConfigDto {
    /// 最大爬取URL数
    #[validate(range(min = 1, max = 100000))]
    pub max_urls: Option<i32>,

    /// 最大爬取深度
    #[validate(range(min = 0, max = 100))]
    pub max_depth: Option<i32>,

    /// 请求间隔（秒）
    #[validate(range(min = 0.0, max = 3600.0))]
    pub delay: Option<f64>,

    pub render_javascript: Option<bool>,
    pub respect_robots: Option<bool>,
    pub follow_redirects: Option<bool>,

    /// 排除规则
    #[validate(length(max = 100))]
    pub exclude_patterns: Option<Vec<String>>,
}

impl CrawlConfigDto {
    /// 以默认配置补齐缺省字段
    pub fn into_config(self) -> CrawlConfig {
        let defaults = CrawlConfig::default();
        CrawlConfig {
            max_urls: self.max_urls.unwrap_or(defaults.max_urls),
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
            delay: self.delay.unwrap_or(defaults.delay),
            render_javascript: self.render_javascript.unwrap_or(defaults.render_javascript),
            respect_robots: self.respect_robots.unwrap_or(defaults.respect_robots),
            follow_redirects: self.follow_redirects.unwrap_or(defaults.follow_redirects),
            exclude_patterns: self.exclude_patterns.unwrap_or(defaults.exclude_patterns),
        }
    }
}
