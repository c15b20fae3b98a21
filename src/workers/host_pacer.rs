// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 按主机的请求节流器
///
/// 每个会话持有一个实例，由该会话的所有工作器共享，因此不同会话的节奏互不影响。
/// 主机首次出现时确定其间隔：取会话 `delay` 与 robots.txt `Crawl-delay` 中较大者。
pub struct HostPacer {
    base_delay: Duration,
    limiters: DashMap<String, Option<Arc<DefaultDirectRateLimiter>>>,
}

impl HostPacer {
    /// 创建节流器
    ///
    /// # 参数
    ///
    /// * `base_delay` - 会话配置的最小请求间隔
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            limiters: DashMap::new(),
        }
    }

    /// 等待直到可以向该主机发出下一次请求
    ///
    /// # 参数
    ///
    /// * `host` - 目标主机
    /// * `crawl_delay` - 主机首次出现时调用，返回 robots.txt 声明的延迟
    pub async fn wait<F, Fut>(&self, host: &str, crawl_delay: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Duration>>,
    {
        let existing = self.limiters.get(host).map(|entry| entry.value().clone());
        let limiter = match existing {
            Some(limiter) => limiter,
            None => {
                let delay = crawl_delay()
                    .await
                    .map_or(self.base_delay, |d| d.max(self.base_delay));
                debug!(host, delay_ms = delay.as_millis() as u64, "Host pacing established");
                // Another worker may have raced us here; the first insert wins
                self.limiters
                    .entry(host.to_string())
                    .or_insert_with(|| limiter_for(delay))
                    .value()
                    .clone()
            }
        };

        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }
    }

    /// 已建立节流的主机数量
    pub fn host_count(&self) -> usize {
        self.limiters.len()
    }
}

fn limiter_for(delay: Duration) -> Option<Arc<DefaultDirectRateLimiter>> {
    Quota::with_period(delay).map(|quota| Arc::new(RateLimiter::direct(quota)))
}
