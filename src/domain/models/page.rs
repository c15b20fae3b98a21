// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 页面实体
///
/// 成功抓取一个队列项的结果。每个完成的队列项对应一个页面，写入后不再更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 页面唯一标识符
    pub id: Uuid,
    /// 所属会话ID
    pub session_id: Uuid,
    /// 对应的队列项ID
    pub queue_item_id: Uuid,
    /// 页面URL
    pub url: String,
    /// 页面标题
    pub title: Option<String>,
    /// HTTP状态码
    pub status_code: Option<i32>,
    /// 加载耗时（秒）
    pub load_time: f64,
    /// 可见文本词数
    pub word_count: Option<i32>,
    /// 爬取深度
    pub depth: i32,
    /// 从文档中提取的元属性
    pub meta: PageMeta,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 页面元属性
///
/// 由页面提取器从HTML文档中得到，以JSON形式持久化在页面行上。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    /// 抓取结束时的最终URL（跟随重定向后）
    pub final_url: Option<String>,
    /// 是否存在 `<title>` 元素
    pub has_title_tag: bool,
    /// meta description，`None` 表示缺失
    pub meta_description: Option<String>,
    /// 第一个 H1 的文本
    pub h1: Option<String>,
    /// H1 数量
    pub h1_count: u32,
    /// 按文档顺序出现的标题级别（1-6）
    pub heading_levels: Vec<u8>,
    /// canonical 链接
    pub canonical: Option<String>,
    /// robots meta 内容
    pub robots: Option<String>,
    /// `<html lang>` 属性
    pub lang: Option<String>,
    /// 是否存在 viewport meta
    pub has_viewport: bool,
    /// Open Graph 标题
    pub og_title: Option<String>,
    /// Open Graph 描述
    pub og_description: Option<String>,
    /// Open Graph 图片
    pub og_image: Option<String>,
    /// 是否存在结构化数据（JSON-LD 或 microdata）
    pub has_structured_data: bool,
    /// 图片总数
    pub image_count: u32,
    /// 缺少 alt 属性的图片数
    pub images_missing_alt: u32,
    /// 既无宽高属性也无 srcset 的图片数
    pub images_missing_dimensions: u32,
    /// 缺少关联 label 的输入控件数
    pub inputs_without_labels: u32,
    /// DOM 元素总数
    pub dom_size: u32,
    /// 可见文本的 SHA-256 摘要
    pub content_hash: Option<String>,
    /// Flesch 易读性分数 [0, 100]，无可见文本时为 0
    pub readability_score: f64,
    /// 出现次数最多的关键词
    pub keyword_density: Vec<KeywordDensity>,
}

/// 关键词出现次数与密度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDensity {
    pub keyword: String,
    pub count: u32,
    /// 占全部单词的百分比，保留两位小数
    pub density: f64,
}

impl Page {
    /// 状态码是否为 2xx
    ///
    /// 缺失状态码视为成功（渲染引擎可能无法报告状态码）。
    pub fn is_success(&self) -> bool {
        self.status_code
            .map(|code| (200..300).contains(&code))
            .unwrap_or(true)
    }

    /// 最终URL是否为 HTTPS
    pub fn is_https(&self) -> bool {
        self.meta
            .final_url
            .as_deref()
            .unwrap_or(&self.url)
            .starts_with("https://")
    }
}
