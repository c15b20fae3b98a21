// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use crate::application::errors::SessionError;
use crate::domain::repositories::session_repository::RepositoryError;

/// 应用错误类型
///
/// 封装处理器中可能出现的所有错误，按错误来源映射到HTTP状态码，
/// 响应体统一为 `{"error": "..."}`。
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 错误对应的HTTP状态码
    pub fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<SessionError>() {
            return session_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }
        if self.0.downcast_ref::<ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        SessionError::NotFound | SessionError::ProjectNotFound => StatusCode::NOT_FOUND,
        SessionError::AlreadyStarted
        | SessionError::Conflict(_)
        | SessionError::InvalidState(_) => StatusCode::CONFLICT,
        SessionError::FatalSeed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::Repository(err) => repository_status(err),
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
