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

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::{dto::crawl_request::CrawlConfigDto, session_manager::SessionManager},
    presentation::errors::AppError,
};

/// 创建并启动爬取会话
///
/// # 参数
///
/// * `project_id` - 项目ID
/// * `payload` - 爬取配置，缺省字段使用默认值
///
/// # 返回值
///
/// 201 与启动后的会话；配置越界返回 400，项目已有活跃会话返回 409
pub async fn create_crawl(
    Extension(manager): Extension<Arc<SessionManager>>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CrawlConfigDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let session = manager.launch(project_id, payload.into_config()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// 获取会话快照
pub async fn get_crawl(
    Extension(manager): Extension<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = manager.get(session_id).await?;
    Ok(Json(session))
}

/// 请求停止会话
///
/// 处理中的队列项会继续完成，会话在它们结束后进入 cancelled。
pub async fn stop_crawl(
    Extension(manager): Extension<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = manager.stop(session_id).await?;
    Ok(Json(session))
}

/// 获取会话进度估算
pub async fn get_progress(
    Extension(manager): Extension<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let progress = manager.progress(session_id).await?;
    Ok(Json(progress))
}
