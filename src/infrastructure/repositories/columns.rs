// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::session_repository::RepositoryError;
use sea_orm::{DbErr, SqlErr};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 序列化为 JSON 列值
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<sea_orm::JsonValue, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::Database(DbErr::Custom(format!("Invalid JSON column: {}", e))))
}

/// 从 JSON 列值反序列化
pub(crate) fn from_json<T: DeserializeOwned>(value: sea_orm::JsonValue) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Database(DbErr::Custom(format!("Invalid JSON column: {}", e))))
}

/// 解析字符串枚举列
pub(crate) fn parse_column<T: std::str::FromStr>(
    column: &str,
    raw: &str,
) -> Result<T, RepositoryError> {
    raw.parse().map_err(|_| {
        RepositoryError::Database(DbErr::Custom(format!("Invalid {} value: {}", column, raw)))
    })
}

/// 将唯一约束冲突转换为 `Conflict`
pub(crate) fn map_insert_error(err: DbErr) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => RepositoryError::Conflict(detail),
        _ => RepositoryError::Database(err),
    }
}
