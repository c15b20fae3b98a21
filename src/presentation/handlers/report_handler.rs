// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::session_manager::SessionManager;
use crate::domain::repositories::analytics_repository::AnalyticsRepository;
use crate::domain::services::aggregator::Aggregator;
use crate::presentation::errors::AppError;

/// 获取会话汇总
///
/// 基于快照读取计算，可在会话运行中调用且不阻塞工作器。
pub async fn get_summary(
    Extension(manager): Extension<Arc<SessionManager>>,
    Extension(analytics): Extension<Arc<dyn AnalyticsRepository>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = manager.get(session_id).await?;
    let failed_pages = u64::try_from(session.failed_urls).unwrap_or(0);

    let summary = Aggregator::new(analytics)
        .summarize(session_id, failed_pages)
        .await?;
    Ok(Json(summary))
}
