// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::session_repository::RepositoryError;
use crate::domain::models::project::Project;
use async_trait::async_trait;
use uuid::Uuid;

/// 项目仓库特质
///
/// 项目数据由外部协作方维护；核心只读取项目，`create` 仅供引导与测试使用。
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// 创建项目
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError>;
    /// 根据ID查找项目
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError>;
}
