// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::query_request::{IssueQueryDto, ListResponseDto, DEFAULT_PAGE_LIMIT};
use crate::application::session_manager::SessionManager;
use crate::domain::repositories::issue_repository::{IssueQuery, IssueRepository};
use crate::presentation::errors::AppError;

/// 按严重程度与类别过滤会话的问题
///
/// 结果按影响分数降序。
pub async fn list_issues(
    Extension(manager): Extension<Arc<SessionManager>>,
    Extension(issues): Extension<Arc<dyn IssueRepository>>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<IssueQueryDto>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    manager.get(session_id).await?;

    let query = IssueQuery {
        session_id,
        severity: params.severity,
        category: params.category,
        offset: params.offset.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    };
    let (items, total) = issues.list_by_session(&query).await?;

    Ok(Json(ListResponseDto {
        items,
        total,
        offset: query.offset,
        limit: query.limit,
    }))
}
