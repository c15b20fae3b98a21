// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// 缓存容量（按 robots.txt 地址计）
const CACHE_CAPACITY: usize = 256;
/// 缓存有效期
const CACHE_TTL: Duration = Duration::from_secs(3600);
/// 获取 robots.txt 的最大尝试次数
const FETCH_ATTEMPTS: u32 = 2;

/// Robots.txt检查器接口
#[async_trait]
pub trait RobotsCheckerTrait: Send + Sync {
    /// 检查URL是否被允许访问
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool>;
    /// 获取爬取延迟
    async fn get_crawl_delay(&self, url_str: &str, user_agent: &str) -> Result<Option<Duration>>;
}

/// 缓存的Robots.txt内容
#[derive(Clone)]
struct CachedRobots {
    content: String,
    expires_at: Instant,
}

/// Robots.txt检查器
///
/// 每个 robots.txt 地址只获取一次并在进程内以 LRU 缓存；
/// 获取失败或返回非 2xx 时视为允许全部访问。
#[derive(Clone)]
pub struct RobotsChecker {
    /// HTTP客户端
    client: Client,
    /// 内存缓存
    cache: Arc<Mutex<LruCache<String, CachedRobots>>>,
}

#[async_trait]
impl RobotsCheckerTrait for RobotsChecker {
    async fn is_allowed(&self, url_str: &str, user_agent: &str) -> Result<bool> {
        let content = self.get_robots_content(url_str, user_agent).await?;
        let mut matcher = DefaultMatcher::default();
        Ok(matcher.one_agent_allowed_by_robots(&content, user_agent, url_str))
    }

    async fn get_crawl_delay(&self, url_str: &str, user_agent: &str) -> Result<Option<Duration>> {
        let content = self.get_robots_content(url_str, user_agent).await?;
        Ok(parse_crawl_delay(&content, user_agent))
    }
}

impl Default for RobotsChecker {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    pub fn new(client: Client) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// 获取Robots.txt内容（带缓存）
    async fn get_robots_content(&self, url_str: &str, user_agent: &str) -> Result<String> {
        let url = Url::parse(url_str)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid URL: {}", url_str))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let robots_url = format!("{}://{}:{}/robots.txt", url.scheme(), host, port);

        // 1. Check memory cache
        {
            let mut cache = self.cache.lock();
            if let Some(cached) = cache.get(&robots_url) {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.content.clone());
                }
                cache.pop(&robots_url);
            }
        }

        // 2. Fetch robots.txt
        let content = self.fetch(&robots_url, user_agent).await;

        // 3. Update memory cache
        self.cache.lock().put(
            robots_url,
            CachedRobots {
                content: content.clone(),
                expires_at: Instant::now() + CACHE_TTL,
            },
        );

        Ok(content)
    }

    async fn fetch(&self, robots_url: &str, user_agent: &str) -> String {
        for attempt in 1..=FETCH_ATTEMPTS {
            let response = self
                .client
                .get(robots_url)
                .header(reqwest::header::USER_AGENT, user_agent)
                .timeout(Duration::from_secs(5))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    return resp.text().await.unwrap_or_default();
                }
                Ok(resp) if resp.status().is_server_error() && attempt < FETCH_ATTEMPTS => {
                    tracing::debug!("robots.txt at {} returned {}, retrying", robots_url, resp.status());
                }
                // 404, 403 and other statuses mean no usable rules
                Ok(_) => return String::new(),
                Err(e) => {
                    tracing::warn!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                }
            }

            tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
        }

        String::new()
    }
}

/// 解析适用于给定 User-Agent 的 Crawl-delay 指令
///
/// 具体 User-Agent 块优先于 `*` 块。
pub fn parse_crawl_delay(content: &str, user_agent: &str) -> Option<Duration> {
    let user_agent = user_agent.to_lowercase();
    let mut current_agent_matched = false;
    let mut specific_agent_found = false;
    let mut delay: Option<f64> = None;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if value == "*" {
                    current_agent_matched = !specific_agent_found;
                } else if user_agent.contains(&value.to_lowercase()) {
                    if !specific_agent_found {
                        delay = None;
                    }
                    current_agent_matched = true;
                    specific_agent_found = true;
                } else {
                    current_agent_matched = false;
                }
            }
            "crawl-delay" if current_agent_matched => {
                if let Ok(d) = value.parse::<f64>() {
                    if d.is_finite() && d >= 0.0 {
                        delay = Some(d);
                    }
                }
            }
            _ => {}
        }
    }

    delay.map(Duration::from_secs_f64)
}
