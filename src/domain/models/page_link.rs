// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 页面链接（有向边）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLink {
    pub id: Uuid,
    pub session_id: Uuid,
    /// 源页面ID
    pub from_page_id: Uuid,
    /// 目标URL（已规范化）
    pub to_url: String,
    /// 链接类型
    pub link_type: LinkType,
    pub created_at: DateTime<Utc>,
}

impl PageLink {
    pub fn new(session_id: Uuid, from_page_id: Uuid, to_url: String, link_type: LinkType) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            from_page_id,
            to_url,
            link_type,
            created_at: Utc::now(),
        }
    }
}

/// 链接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// 站内链接
    Internal,
    /// 站外链接
    External,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkType::Internal => write!(f, "internal"),
            LinkType::External => write!(f, "external"),
        }
    }
}

impl FromStr for LinkType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(LinkType::Internal),
            "external" => Ok(LinkType::External),
            _ => Err(()),
        }
    }
}
