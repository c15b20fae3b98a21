// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchEngine, FetchRequest, FetchResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 抓取引擎路由器
///
/// 按请求特征为每次抓取选择支持分数最高的引擎。管线只面对路由器，
/// 不关心实际使用的是纯HTTP客户端还是渲染引擎。
pub struct FetchRouter {
    engines: Vec<Arc<dyn FetchEngine>>,
}

impl FetchRouter {
    /// 创建新的引擎路由器
    ///
    /// # 参数
    ///
    /// * `engines` - 引擎列表
    pub fn new(engines: Vec<Arc<dyn FetchEngine>>) -> Self {
        Self { engines }
    }

    /// 选择支持分数最高的引擎
    ///
    /// 分数相同时保留注册顺序靠前的引擎。
    pub fn select(&self, request: &FetchRequest) -> Option<&Arc<dyn FetchEngine>> {
        self.engines
            .iter()
            .enumerate()
            .filter(|(_, engine)| engine.support_score(request) > 0)
            .max_by_key(|(index, engine)| (engine.support_score(request), usize::MAX - index))
            .map(|(_, engine)| engine)
    }

    /// 已注册引擎的名称
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl FetchEngine for FetchRouter {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        let engine = self
            .select(request)
            .ok_or_else(|| EngineError::Other("No engine available for request".to_string()))?;
        debug!(engine = engine.name(), url = %request.url, "Routing fetch");
        engine.fetch(request).await
    }

    fn support_score(&self, request: &FetchRequest) -> u8 {
        self.select(request)
            .map(|e| e.support_score(request))
            .unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "router"
    }
}
