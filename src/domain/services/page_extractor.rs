// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page::PageMeta;
use crate::domain::services::text_metrics;
use scraper::{ElementRef, Html, Node, Selector};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

/// 页面分析错误
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// 选择器构造失败
    #[error("Invalid selector '{0}': {1}")]
    Selector(&'static str, String),
    /// 页面URL无法解析，无法作为相对链接的基准
    #[error("Invalid page URL '{0}'")]
    InvalidUrl(String),
    /// 分析任务异常终止
    #[error("Analysis aborted: {0}")]
    Aborted(String),
}

/// 不计入可见文本的元素
const INVISIBLE_ELEMENTS: [&str; 6] = ["head", "script", "style", "noscript", "template", "svg"];

/// 不需要 label 的 input 类型
const UNLABELLED_INPUT_TYPES: [&str; 5] = ["hidden", "submit", "button", "image", "reset"];

/// 从文档中提取的页面事实
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    /// `<title>` 文本（去除首尾空白）；缺少标签时为 `None`
    pub title: Option<String>,
    /// 可见文本词数
    pub word_count: i32,
    /// 元属性
    pub meta: PageMeta,
}

fn selector(css: &'static str) -> Result<Selector, AnalysisError> {
    Selector::parse(css).map_err(|e| AnalysisError::Selector(css, format!("{:?}", e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// 页面提取器
///
/// 把 HTML 文档转换为页面事实（标题、词数、元属性），不访问网络。
pub struct PageExtractor;

impl PageExtractor {
    /// 提取页面事实
    ///
    /// # 参数
    ///
    /// * `html` - HTML 文档
    /// * `final_url` - 抓取结束时的URL
    ///
    /// # 返回值
    ///
    /// * `Ok(ExtractedPage)` - 提取结果
    /// * `Err(AnalysisError)` - 选择器构造失败
    pub fn extract(html: &str, final_url: &str) -> Result<ExtractedPage, AnalysisError> {
        let document = Html::parse_document(html);
        let mut meta = PageMeta {
            final_url: Some(final_url.to_string()),
            ..Default::default()
        };

        // Title
        let title = document
            .select(&selector("title")?)
            .next()
            .map(text_of);
        meta.has_title_tag = title.is_some();

        // Meta tags
        for element in document.select(&selector("meta")?) {
            let attrs = element.value();
            let content = attrs.attr("content");
            if let Some(name) = attrs.attr("name") {
                match name.trim().to_lowercase().as_str() {
                    "description" => {
                        meta.meta_description = Some(content.unwrap_or_default().trim().to_string())
                    }
                    "robots" => meta.robots = non_empty(content).map(|c| c.to_lowercase()),
                    "viewport" => meta.has_viewport = true,
                    _ => {}
                }
            }
            if let Some(property) = attrs.attr("property") {
                match property.trim().to_lowercase().as_str() {
                    "og:title" => meta.og_title = non_empty(content),
                    "og:description" => meta.og_description = non_empty(content),
                    "og:image" => meta.og_image = non_empty(content),
                    _ => {}
                }
            }
        }

        // Headings in document order
        for heading in document.select(&selector("h1, h2, h3, h4, h5, h6")?) {
            let level = heading
                .value()
                .name()
                .trim_start_matches('h')
                .parse::<u8>()
                .unwrap_or(0);
            if level == 1 {
                meta.h1_count += 1;
                if meta.h1.is_none() {
                    meta.h1 = Some(text_of(heading));
                }
            }
            meta.heading_levels.push(level);
        }

        // Canonical
        meta.canonical = document
            .select(&selector("link[rel]")?)
            .find(|l| {
                l.value()
                    .attr("rel")
                    .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
                    .unwrap_or(false)
            })
            .and_then(|l| non_empty(l.value().attr("href")));

        meta.lang = document
            .select(&selector("html")?)
            .next()
            .and_then(|h| non_empty(h.value().attr("lang")));

        meta.has_structured_data = document
            .select(&selector("script[type=\"application/ld+json\"], [itemscope]")?)
            .next()
            .is_some();

        // Images
        for img in document.select(&selector("img")?) {
            let attrs = img.value();
            meta.image_count += 1;
            if attrs.attr("alt").is_none() {
                meta.images_missing_alt += 1;
            }
            if attrs.attr("width").is_none()
                && attrs.attr("height").is_none()
                && attrs.attr("srcset").is_none()
            {
                meta.images_missing_dimensions += 1;
            }
        }

        meta.inputs_without_labels = Self::count_unlabelled_inputs(&document)?;
        meta.dom_size = document
            .root_element()
            .descendants()
            .filter(|n| n.value().is_element())
            .count() as u32;

        // Visible text
        let words = Self::visible_words(&document);
        if !words.is_empty() {
            let mut hasher = Sha256::new();
            hasher.update(words.join(" ").to_lowercase().as_bytes());
            meta.content_hash = Some(hex::encode(hasher.finalize()));
        }
        meta.readability_score = text_metrics::readability_score(&words);
        meta.keyword_density = text_metrics::keyword_density(&words);

        Ok(ExtractedPage {
            title,
            word_count: words.len() as i32,
            meta,
        })
    }

    fn visible_words(document: &Html) -> Vec<&str> {
        document
            .root_element()
            .descendants()
            .filter_map(|node| match node.value() {
                Node::Text(text) => {
                    let hidden = node.ancestors().any(|a| {
                        a.value()
                            .as_element()
                            .map(|e| INVISIBLE_ELEMENTS.contains(&e.name()))
                            .unwrap_or(false)
                    });
                    (!hidden).then(|| &**text)
                }
                _ => None,
            })
            .flat_map(str::split_whitespace)
            .collect()
    }

    fn count_unlabelled_inputs(document: &Html) -> Result<u32, AnalysisError> {
        let labelled: HashSet<&str> = document
            .select(&selector("label[for]")?)
            .filter_map(|l| l.value().attr("for"))
            .collect();

        let count = document
            .select(&selector("input, select, textarea")?)
            .filter(|control| {
                let attrs = control.value();
                if attrs.name() == "input" {
                    let kind = attrs.attr("type").unwrap_or("text").to_lowercase();
                    if UNLABELLED_INPUT_TYPES.contains(&kind.as_str()) {
                        return false;
                    }
                }
                if attrs.attr("aria-label").is_some() || attrs.attr("aria-labelledby").is_some() {
                    return false;
                }
                if attrs.attr("id").is_some_and(|id| labelled.contains(id)) {
                    return false;
                }
                !control.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .map(|e| e.name() == "label")
                        .unwrap_or(false)
                })
            })
            .count();

        Ok(count as u32)
    }
}
