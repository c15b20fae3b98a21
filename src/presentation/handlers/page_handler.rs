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

use crate::application::dto::query_request::{ListResponseDto, PageDetailDto, PaginationQuery};
use crate::application::session_manager::SessionManager;
use crate::domain::repositories::issue_repository::IssueRepository;
use crate::domain::repositories::page_repository::PageRepository;
use crate::domain::repositories::session_repository::RepositoryError;
use crate::presentation::errors::AppError;

/// 分页列出会话的页面
pub async fn list_pages(
    Extension(manager): Extension<Arc<SessionManager>>,
    Extension(pages): Extension<Arc<dyn PageRepository>>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    // Unknown sessions are 404 rather than an empty list
    manager.get(session_id).await?;

    let (offset, limit) = (query.offset(), query.limit());
    let (items, total) = pages.list_by_session(session_id, offset, limit).await?;
    Ok(Json(ListResponseDto {
        items,
        total,
        offset,
        limit,
    }))
}

/// 获取页面详情，包含问题与出站链接
pub async fn get_page(
    Extension(pages): Extension<Arc<dyn PageRepository>>,
    Extension(issues): Extension<Arc<dyn IssueRepository>>,
    Path(page_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let page = pages
        .find_by_id(page_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    let issues = issues.list_by_page(page_id).await?;
    let links = pages.find_links_from(page_id).await?;

    Ok(Json(PageDetailDto {
        page,
        issues,
        links,
    }))
}
