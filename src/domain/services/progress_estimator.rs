// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// 估算值
///
/// 无法估算时序列化为字符串 `"unknown"`，而不是 0 或无穷大。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Known(f64),
    Unknown,
}

impl Estimate {
    pub fn value(self) -> Option<f64> {
        match self {
            Estimate::Known(v) => Some(v),
            Estimate::Unknown => None,
        }
    }
}

impl Serialize for Estimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Estimate::Known(v) => serializer.serialize_f64(*v),
            Estimate::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// 进度估算结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// 完成百分比 [0, 100]
    pub percentage: Estimate,
    /// 剩余时间（秒）
    pub remaining_seconds: Estimate,
}

/// 估算会话进度
///
/// # 参数
///
/// * `crawled_urls` - 已爬取URL数
/// * `total_urls` - 估算总数，未知时为 `None`；已知为 0 时视为已完成
/// * `started_at` - 会话开始时间
/// * `now` - 当前时间
pub fn estimate(
    crawled_urls: i32,
    total_urls: Option<i32>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Progress {
    let total = match total_urls {
        None => {
            return Progress {
                percentage: Estimate::Unknown,
                remaining_seconds: Estimate::Unknown,
            }
        }
        // A known empty crawl has nothing left to do
        Some(total) if total <= 0 => {
            return Progress {
                percentage: Estimate::Known(100.0),
                remaining_seconds: Estimate::Known(0.0),
            }
        }
        Some(total) => total,
    };

    let crawled = crawled_urls.max(0).min(total);
    let percentage = Estimate::Known(f64::from(crawled) * 100.0 / f64::from(total));

    let elapsed = (now - started_at).num_milliseconds() as f64 / 1000.0;
    let remaining_seconds = if crawled == 0 || elapsed <= 0.0 {
        Estimate::Unknown
    } else {
        let rate = f64::from(crawled) / elapsed;
        Estimate::Known(f64::from(total - crawled) / rate)
    };

    Progress {
        percentage,
        remaining_seconds,
    }
}
