// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// 浏览器渲染引擎
///
/// 基于chromiumoxide实现。浏览器只在首次需要渲染时启动（或连接远程实例），
/// 之后在所有会话间复用。
///
/// 浏览器无法可靠地报告导航的HTTP状态码，因此先用纯HTTP引擎取得状态码、
/// 最终URL与内容类型，只对 2xx 的HTML页面再做渲染；渲染失败时退回纯HTTP文档。
pub struct BrowserEngine {
    plain: Arc<ReqwestEngine>,
    browser: OnceCell<Browser>,
    remote_debugging_url: Option<String>,
}

impl BrowserEngine {
    /// 创建浏览器渲染引擎
    ///
    /// # 参数
    ///
    /// * `plain` - 用于获取状态码与兜底文档的纯HTTP引擎
    /// * `remote_debugging_url` - 远程 Chrome 调试地址，`None` 时本地启动
    pub fn new(plain: Arc<ReqwestEngine>, remote_debugging_url: Option<String>) -> Self {
        Self {
            plain,
            browser: OnceCell::new(),
            remote_debugging_url,
        }
    }

    async fn browser(&self) -> Result<&Browser, EngineError> {
        self.browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = if let Some(url) = &self.remote_debugging_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url)
                        .await
                        .map_err(|e| EngineError::Render(format!("connect: {}", e)))?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(30))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .build()
                        .map_err(EngineError::Render)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| EngineError::Render(format!("launch: {}", e)))?
                };

                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }

    async fn render(&self, url: &str, user_agent: &str) -> Result<String, EngineError> {
        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Render(e.to_string()))?;

        let result = async {
            page.set_user_agent(user_agent)
                .await
                .map_err(|e| EngineError::Render(e.to_string()))?;
            page.goto(url)
                .await
                .map_err(|e| EngineError::Render(e.to_string()))?;
            page.content()
                .await
                .map_err(|e| EngineError::Render(e.to_string()))
        }
        .await;

        if let Err(e) = page.close().await {
            warn!("Failed to close browser tab: {}", e);
        }
        result
    }
}

#[async_trait]
impl FetchEngine for BrowserEngine {
    /// 执行渲染抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 渲染后的文档（或渲染失败时的纯HTTP文档）
    /// * `Err(EngineError)` - 纯HTTP请求本身失败
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let start = Instant::now();
        let mut response = self.plain.fetch(request).await?;

        if !response.is_html() || !is_success_status(response.status_code) {
            return Ok(response);
        }

        let remaining = request.timeout.saturating_sub(start.elapsed());
        match tokio::time::timeout(remaining, self.render(&response.final_url, &request.user_agent))
            .await
        {
            Ok(Ok(html)) => response.html = html,
            Ok(Err(e)) => warn!(url = %request.url, "Render failed, using plain document: {}", e),
            Err(_) => warn!(url = %request.url, "Render timed out, using plain document"),
        }
        response.load_time = start.elapsed();
        Ok(response)
    }

    fn support_score(&self, request: &FetchRequest) -> u8 {
        if request.render_javascript {
            return 100;
        }
        10
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

fn is_success_status(status_code: Option<u16>) -> bool {
    status_code
        .map(|code| (200..300).contains(&code))
        .unwrap_or(true)
}
