// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::issue::{impact_score, Category, Issue, Severity};
use crate::domain::models::page::Page;
use crate::utils::url_utils::normalize_str;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

/// 标题长度下限（字符）
pub const TITLE_MIN_LEN: usize = 30;
/// 标题长度上限（字符）
pub const TITLE_MAX_LEN: usize = 60;
/// meta description 长度下限（字符）
pub const DESCRIPTION_MIN_LEN: usize = 120;
/// meta description 长度上限（字符）
pub const DESCRIPTION_MAX_LEN: usize = 160;
/// DOM 元素数上限
pub const DOM_SIZE_LIMIT: u32 = 1500;
/// 慢加载阈值（秒）
pub const SLOW_LOAD_SECS: f64 = 3.0;
/// 低词数阈值
pub const LOW_WORD_COUNT: i32 = 300;

/// 分析失败时记录的合成问题类型
pub const ANALYSIS_FAILED: &str = "analysis_failed";

/// 规则产出的问题草稿
///
/// 严重程度与类别由规则固有决定，影响分数由检测器统一计算。
#[derive(Debug, Clone, PartialEq)]
pub struct IssueDraft {
    pub issue_type: &'static str,
    pub severity: Severity,
    pub category: Category,
    pub description: String,
    pub recommendation: Option<&'static str>,
}

impl IssueDraft {
    fn new(
        issue_type: &'static str,
        severity: Severity,
        category: Category,
        description: impl Into<String>,
        recommendation: &'static str,
    ) -> Self {
        Self {
            issue_type,
            severity,
            category,
            description: description.into(),
            recommendation: Some(recommendation),
        }
    }
}

/// 问题检测规则
///
/// 规则是纯函数：不访问网络，也不读取可变共享状态。
pub trait IssueRule: Send + Sync {
    /// 规则名称
    fn name(&self) -> &'static str;

    /// 非 2xx 页面是否仍然执行该规则
    fn applies_to_error_pages(&self) -> bool {
        false
    }

    /// 检查页面
    fn check(&self, page: &Page) -> Vec<IssueDraft>;
}

/// 问题检测器
///
/// 持有规则注册表，按注册顺序执行规则，同一页面内按 `issue_type` 去重。
/// 非 2xx 页面只执行声明了 `applies_to_error_pages` 的规则。
pub struct IssueDetector {
    rules: Vec<Box<dyn IssueRule>>,
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueDetector {
    /// 创建带有内置规则集的检测器
    pub fn new() -> Self {
        Self::with_rules(vec![
            Box::new(HttpStatusRule),
            Box::new(HttpsRule),
            Box::new(TitleRule),
            Box::new(MetaDescriptionRule),
            Box::new(HeadingRule),
            Box::new(CanonicalRule),
            Box::new(RobotsMetaRule),
            Box::new(StructuredDataRule),
            Box::new(ImageRule),
            Box::new(DomSizeRule),
            Box::new(LoadTimeRule),
            Box::new(FormLabelRule),
            Box::new(HtmlLangRule),
            Box::new(ViewportRule),
            Box::new(OpenGraphRule),
            Box::new(ContentLengthRule),
        ])
    }

    /// 使用指定规则创建检测器
    pub fn with_rules(rules: Vec<Box<dyn IssueRule>>) -> Self {
        Self { rules }
    }

    /// 注册新规则
    pub fn register(&mut self, rule: Box<dyn IssueRule>) {
        self.rules.push(rule);
    }

    /// 已注册的规则名称
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// 检测页面问题
    ///
    /// # 参数
    ///
    /// * `page` - 待检测的页面
    ///
    /// # 返回值
    ///
    /// 页面的问题列表，`issue_type` 不重复
    pub fn detect(&self, page: &Page) -> Vec<Issue> {
        let error_page = !page.is_success();
        let mut seen = HashSet::new();

        self.rules
            .iter()
            .filter(|rule| !error_page || rule.applies_to_error_pages())
            .flat_map(|rule| rule.check(page))
            .filter(|draft| seen.insert(draft.issue_type))
            .map(|draft| to_issue(page, draft))
            .collect()
    }

    /// 构造分析失败的合成问题
    pub fn analysis_failed(page_id: Uuid, session_id: Uuid, error: &str) -> Issue {
        let severity = Severity::Medium;
        let category = Category::Technical;
        Issue {
            id: Uuid::new_v4(),
            page_id,
            session_id,
            issue_type: ANALYSIS_FAILED.to_string(),
            severity,
            category,
            description: format!("Page analysis failed: {}", error),
            recommendation: Some(
                "Check that the page returns well-formed HTML and re-run the crawl".to_string(),
            ),
            impact_score: impact_score(severity, category),
            created_at: Utc::now(),
        }
    }
}

fn to_issue(page: &Page, draft: IssueDraft) -> Issue {
    Issue {
        id: Uuid::new_v4(),
        page_id: page.id,
        session_id: page.session_id,
        issue_type: draft.issue_type.to_string(),
        severity: draft.severity,
        category: draft.category,
        description: draft.description,
        recommendation: draft.recommendation.map(str::to_string),
        impact_score: impact_score(draft.severity, draft.category),
        created_at: Utc::now(),
    }
}

/// HTTP 错误状态码
pub struct HttpStatusRule;

impl IssueRule for HttpStatusRule {
    fn name(&self) -> &'static str {
        "http_status"
    }

    fn applies_to_error_pages(&self) -> bool {
        true
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        match page.status_code {
            Some(code) if code >= 500 => vec![IssueDraft::new(
                "server_error",
                Severity::Critical,
                Category::Technical,
                format!("Page returned HTTP {}", code),
                "Fix the server error so the page can be served and indexed",
            )],
            Some(code) if code >= 400 => vec![IssueDraft::new(
                "client_error",
                Severity::High,
                Category::Technical,
                format!("Page returned HTTP {}", code),
                "Restore the page or remove links pointing to it",
            )],
            _ => Vec::new(),
        }
    }
}

/// 非 HTTPS 页面
pub struct HttpsRule;

impl IssueRule for HttpsRule {
    fn name(&self) -> &'static str {
        "https"
    }

    fn applies_to_error_pages(&self) -> bool {
        true
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.is_https() {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "not_https",
            Severity::High,
            Category::Security,
            "Page is not served over HTTPS",
            "Serve the page over HTTPS and redirect HTTP requests",
        )]
    }
}

/// 标题规则
pub struct TitleRule;

impl IssueRule for TitleRule {
    fn name(&self) -> &'static str {
        "title"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let title = match page.title.as_deref() {
            Some(title) if page.meta.has_title_tag || !title.is_empty() => title,
            _ => {
                return vec![IssueDraft::new(
                    "missing_title",
                    Severity::High,
                    Category::Technical,
                    "Page is missing a title tag",
                    "Add a unique, descriptive title tag of 30-60 characters",
                )]
            }
        };

        let len = title.chars().count();
        if len == 0 {
            vec![IssueDraft::new(
                "empty_title",
                Severity::High,
                Category::Technical,
                "Title tag is empty",
                "Add descriptive text to the title tag",
            )]
        } else if len < TITLE_MIN_LEN {
            vec![IssueDraft::new(
                "short_title",
                Severity::Medium,
                Category::Content,
                format!("Title is too short ({} characters)", len),
                "Expand the title to 30-60 characters",
            )]
        } else if len > TITLE_MAX_LEN {
            vec![IssueDraft::new(
                "long_title",
                Severity::Medium,
                Category::Content,
                format!("Title is too long ({} characters)", len),
                "Shorten the title to 60 characters or fewer",
            )]
        } else {
            Vec::new()
        }
    }
}

/// meta description 规则
pub struct MetaDescriptionRule;

impl IssueRule for MetaDescriptionRule {
    fn name(&self) -> &'static str {
        "meta_description"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let Some(description) = page.meta.meta_description.as_deref() else {
            return vec![IssueDraft::new(
                "missing_meta_description",
                Severity::High,
                Category::Content,
                "Page is missing a meta description",
                "Add a meta description of 120-160 characters",
            )];
        };

        let len = description.chars().count();
        if len == 0 {
            vec![IssueDraft::new(
                "empty_meta_description",
                Severity::High,
                Category::Content,
                "Meta description is empty",
                "Add descriptive text to the meta description",
            )]
        } else if len < DESCRIPTION_MIN_LEN {
            vec![IssueDraft::new(
                "short_meta_description",
                Severity::Low,
                Category::Content,
                format!("Meta description is too short ({} characters)", len),
                "Expand the meta description to 120-160 characters",
            )]
        } else if len > DESCRIPTION_MAX_LEN {
            vec![IssueDraft::new(
                "long_meta_description",
                Severity::Medium,
                Category::Content,
                format!("Meta description is too long ({} characters)", len),
                "Shorten the meta description to 160 characters or fewer",
            )]
        } else {
            Vec::new()
        }
    }
}

/// 标题层级规则
pub struct HeadingRule;

impl IssueRule for HeadingRule {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let mut issues = Vec::new();

        match page.meta.h1_count {
            0 => issues.push(IssueDraft::new(
                "missing_h1",
                Severity::High,
                Category::Technical,
                "Page is missing an H1 heading",
                "Add a single H1 heading describing the page",
            )),
            1 => {}
            n => issues.push(IssueDraft::new(
                "multiple_h1",
                Severity::Medium,
                Category::Technical,
                format!("Page has {} H1 headings", n),
                "Use a single H1 heading per page",
            )),
        }

        if let Some((from, to)) = page
            .meta
            .heading_levels
            .windows(2)
            .map(|w| (w[0], w[1]))
            .find(|(from, to)| *to > *from + 1)
        {
            issues.push(IssueDraft::new(
                "skipped_heading_level",
                Severity::Low,
                Category::Accessibility,
                format!("Heading structure skips from H{} to H{}", from, to),
                "Use heading levels sequentially without skipping",
            ));
        }

        issues
    }
}

/// canonical 规则
pub struct CanonicalRule;

impl IssueRule for CanonicalRule {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let Some(canonical) = page.meta.canonical.as_deref() else {
            return vec![IssueDraft::new(
                "missing_canonical",
                Severity::Medium,
                Category::Technical,
                "Page is missing a canonical URL",
                "Add a canonical link pointing to the preferred URL",
            )];
        };

        let page_url = page.meta.final_url.as_deref().unwrap_or(&page.url);
        let self_referencing = match (normalize_str(canonical), normalize_str(page_url)) {
            (Some(c), Some(p)) => c == p,
            _ => canonical == page_url,
        };

        if self_referencing {
            Vec::new()
        } else {
            vec![IssueDraft::new(
                "non_self_canonical",
                Severity::Low,
                Category::Technical,
                format!("Canonical URL points to {}", canonical),
                "Verify that the canonical URL is intentional",
            )]
        }
    }
}

/// robots meta 规则
pub struct RobotsMetaRule;

impl IssueRule for RobotsMetaRule {
    fn name(&self) -> &'static str {
        "robots_meta"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let Some(robots) = page.meta.robots.as_deref() else {
            return Vec::new();
        };
        let directives: Vec<&str> = robots.split(',').map(str::trim).collect();
        let mut issues = Vec::new();

        if directives.contains(&"noindex") || directives.contains(&"none") {
            issues.push(IssueDraft::new(
                "noindex_found",
                Severity::Critical,
                Category::Technical,
                "Page is blocked from indexing by the robots meta tag",
                "Remove noindex if the page should appear in search results",
            ));
        }
        if directives.contains(&"nofollow") || directives.contains(&"none") {
            issues.push(IssueDraft::new(
                "nofollow_found",
                Severity::Medium,
                Category::Technical,
                "Links on this page are not followed by search engines",
                "Remove nofollow if the links should pass authority",
            ));
        }

        issues
    }
}

/// 结构化数据规则
pub struct StructuredDataRule;

impl IssueRule for StructuredDataRule {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.meta.has_structured_data {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "missing_schema",
            Severity::Low,
            Category::Technical,
            "Page has no structured data",
            "Add JSON-LD structured data describing the page content",
        )]
    }
}

/// 图片规则
pub struct ImageRule;

impl IssueRule for ImageRule {
    fn name(&self) -> &'static str {
        "images"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let mut issues = Vec::new();

        if page.meta.images_missing_dimensions > 0 {
            issues.push(IssueDraft::new(
                "unoptimized_images",
                Severity::Medium,
                Category::Performance,
                format!(
                    "{} images may not be optimized",
                    page.meta.images_missing_dimensions
                ),
                "Add width/height attributes and consider responsive images",
            ));
        }
        if page.meta.images_missing_alt > 0 {
            issues.push(IssueDraft::new(
                "missing_alt_text",
                Severity::Medium,
                Category::Accessibility,
                format!("{} images are missing alt text", page.meta.images_missing_alt),
                "Add descriptive alt text to every informative image",
            ));
        }

        issues
    }
}

/// DOM 规模规则
pub struct DomSizeRule;

impl IssueRule for DomSizeRule {
    fn name(&self) -> &'static str {
        "dom_size"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.meta.dom_size <= DOM_SIZE_LIMIT {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "large_dom",
            Severity::Medium,
            Category::Performance,
            format!("Page has {} DOM elements", page.meta.dom_size),
            "Reduce the number of DOM elements below 1500",
        )]
    }
}

/// 加载耗时规则
pub struct LoadTimeRule;

impl IssueRule for LoadTimeRule {
    fn name(&self) -> &'static str {
        "load_time"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.load_time <= SLOW_LOAD_SECS {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "slow_load_time",
            Severity::Medium,
            Category::Performance,
            format!("Page took {:.2}s to load", page.load_time),
            "Reduce server response time and page weight",
        )]
    }
}

/// 表单 label 规则
pub struct FormLabelRule;

impl IssueRule for FormLabelRule {
    fn name(&self) -> &'static str {
        "form_labels"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.meta.inputs_without_labels == 0 {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "inputs_without_labels",
            Severity::Medium,
            Category::Accessibility,
            format!(
                "{} form inputs are missing labels",
                page.meta.inputs_without_labels
            ),
            "Associate every form input with a label element",
        )]
    }
}

/// html lang 规则
pub struct HtmlLangRule;

impl IssueRule for HtmlLangRule {
    fn name(&self) -> &'static str {
        "html_lang"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.meta.lang.is_some() {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "missing_html_lang",
            Severity::Medium,
            Category::Accessibility,
            "The html element has no lang attribute",
            "Declare the page language with <html lang=\"...\">",
        )]
    }
}

/// viewport 规则
pub struct ViewportRule;

impl IssueRule for ViewportRule {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        if page.meta.has_viewport {
            return Vec::new();
        }
        vec![IssueDraft::new(
            "missing_viewport",
            Severity::Medium,
            Category::Mobile,
            "Page has no viewport meta tag",
            "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
        )]
    }
}

/// Open Graph 规则
pub struct OpenGraphRule;

impl IssueRule for OpenGraphRule {
    fn name(&self) -> &'static str {
        "open_graph"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        let mut issues = Vec::new();
        if page.meta.og_title.is_none() {
            issues.push(IssueDraft::new(
                "missing_og_title",
                Severity::Low,
                Category::Social,
                "Open Graph title is missing",
                "Add an og:title meta tag for social sharing",
            ));
        }
        if page.meta.og_description.is_none() {
            issues.push(IssueDraft::new(
                "missing_og_description",
                Severity::Low,
                Category::Social,
                "Open Graph description is missing",
                "Add an og:description meta tag for social sharing",
            ));
        }
        if page.meta.og_image.is_none() {
            issues.push(IssueDraft::new(
                "missing_og_image",
                Severity::Low,
                Category::Social,
                "Open Graph image is missing",
                "Add an og:image meta tag for social sharing",
            ));
        }
        issues
    }
}

/// 内容长度规则
pub struct ContentLengthRule;

impl IssueRule for ContentLengthRule {
    fn name(&self) -> &'static str {
        "content_length"
    }

    fn check(&self, page: &Page) -> Vec<IssueDraft> {
        match page.word_count {
            Some(0) => vec![IssueDraft::new(
                "thin_content",
                Severity::Medium,
                Category::Content,
                "Page has no visible text content",
                "Add meaningful text content to the page",
            )],
            Some(n) if n < LOW_WORD_COUNT => vec![IssueDraft::new(
                "low_word_count",
                Severity::Low,
                Category::Content,
                format!("Page has only {} words", n),
                "Expand the page content to at least 300 words",
            )],
            _ => Vec::new(),
        }
    }
}
