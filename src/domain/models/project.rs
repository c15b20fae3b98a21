// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// 项目实体
///
/// 项目由外部协作方维护，爬取核心仅以只读方式引用其标识与域名。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// 项目唯一标识符
    pub id: Uuid,
    /// 项目名称
    pub name: String,
    /// 项目域名，可以是裸域名（`example.com`）或完整URL
    pub domain: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// 创建新项目
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domain: domain.into(),
            created_at: Utc::now(),
        }
    }

    /// 计算项目的根URL
    ///
    /// 裸域名补全为 `https://` 前缀；带协议的域名保持原样。
    ///
    /// # 返回值
    ///
    /// * `Some(Url)` - 域名可解析且包含主机名
    /// * `None` - 域名格式错误
    pub fn root_url(&self) -> Option<Url> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return None;
        }

        let candidate = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain)
        };

        let url = Url::parse(&candidate).ok()?;
        url.host_str()?;
        Some(url)
    }

    /// 项目主机名（小写），用于内外链分类
    pub fn host(&self) -> Option<String> {
        self.root_url()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}
