// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::page_extractor::AnalysisError;
use crate::domain::models::page_link::LinkType;
use crate::utils::url_utils::{is_http, normalize_url, resolve_url, same_host};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// 发现的出站链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// 规范化后的绝对URL
    pub url: String,
    /// 站内或站外
    pub link_type: LinkType,
}

/// 链接发现器
///
/// 负责从HTML内容中提取出站链接，并按项目主机名区分站内与站外链接
pub struct LinkDiscoverer;

impl LinkDiscoverer {
    /// 从HTML内容中提取链接
    ///
    /// 结果按文档顺序排列并去重，保证入队顺序确定。
    ///
    /// # 参数
    ///
    /// * `html_content` - HTML内容
    /// * `base_url` - 页面最终URL，用于解析相对链接
    /// * `project_host` - 项目主机名
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<DiscoveredLink>)` - 提取到的链接
    /// * `Err(AnalysisError)` - 选择器构造失败
    pub fn extract_links(
        html_content: &str,
        base_url: &Url,
        project_host: &str,
    ) -> Result<Vec<DiscoveredLink>, AnalysisError> {
        let document = Html::parse_document(html_content);
        let selector = Selector::parse("a[href]")
            .map_err(|e| AnalysisError::Selector("a[href]", format!("{:?}", e)))?;

        // <base href> overrides the document URL for relative links
        let base = Selector::parse("base[href]")
            .ok()
            .and_then(|s| {
                document
                    .select(&s)
                    .next()
                    .and_then(|b| b.value().attr("href"))
                    .and_then(|href| resolve_url(base_url, href).ok())
            })
            .unwrap_or_else(|| base_url.clone());

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();

            // Ignore fragment identifiers, mailto, tel and javascript links
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("javascript:")
            {
                continue;
            }

            let Ok(url) = resolve_url(&base, href) else {
                continue;
            };
            if !is_http(&url) {
                continue;
            }

            let normalized = normalize_url(&url);
            if !seen.insert(normalized.clone()) {
                continue;
            }

            let link_type = if same_host(&url, project_host) {
                LinkType::Internal
            } else {
                LinkType::External
            };
            links.push(DiscoveredLink {
                url: normalized,
                link_type,
            });
        }

        Ok(links)
    }
}
