// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化URL，作为会话内去重的键
///
/// 协议与主机名小写、省略默认端口（由 `url` 解析完成），去除片段。
/// 路径与查询大小写敏感，保持原样。
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.to_string()
}

/// 解析并规范化URL字符串
///
/// # 返回值
///
/// * `Some(String)` - 可解析的 http/https URL
/// * `None` - 无法解析或非 http(s) 协议
pub fn normalize_str(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !is_http(&url) {
        return None;
    }
    Some(normalize_url(&url))
}

/// 是否为 http/https 协议
pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// URL 主机名是否与给定主机相同（忽略大小写）
pub fn same_host(url: &Url, host: &str) -> bool {
    url.host_str()
        .map(|h| h.eq_ignore_ascii_case(host))
        .unwrap_or(false)
}
