// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Instant;

/// 跟随重定向时的最大跳数
const MAX_REDIRECTS: usize = 10;

/// HTTP抓取引擎
///
/// 基于reqwest实现的纯HTTP抓取引擎。重定向策略在客户端构建时确定，
/// 因此分别持有跟随重定向与不跟随重定向的两个客户端，按请求选择。
pub struct ReqwestEngine {
    following: Client,
    direct: Client,
}

impl ReqwestEngine {
    /// 创建HTTP抓取引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 默认 User-Agent
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(EngineError)` - 客户端构建失败
    pub fn new(user_agent: &str) -> Result<Self, EngineError> {
        let following = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .cookie_store(true)
            .build()?;
        let direct = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .cookie_store(true)
            .build()?;

        Ok(Self { following, direct })
    }

    fn client_for(&self, request: &FetchRequest) -> &Client {
        if request.follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }
}

#[async_trait]
impl FetchEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// 任何HTTP状态码都视为成功抓取，由问题检测器处理错误页面；
    /// 只有网络错误与超时返回 `Err`。
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let start = Instant::now();
        let response = self
            .client_for(request)
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, request.user_agent.as_str())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout
                } else {
                    EngineError::RequestFailed(e)
                }
            })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);

        let html = response.text().await?;

        Ok(FetchResponse {
            status_code: Some(status_code),
            html,
            final_url,
            content_type,
            load_time: start.elapsed(),
        })
    }

    /// 计算对请求的支持分数
    ///
    /// 不需要渲染的请求返回100分，需要渲染时仅作为兜底
    fn support_score(&self, request: &FetchRequest) -> u8 {
        if request.render_javascript {
            return 10;
        }
        100
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
