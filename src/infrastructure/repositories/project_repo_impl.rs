// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::project::Project;
use crate::domain::repositories::project_repository::ProjectRepository;
use crate::domain::repositories::session_repository::RepositoryError;
use crate::infrastructure::database::entities::project as project_entity;
use super::columns::map_insert_error;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 项目仓库实现
pub struct ProjectRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<project_entity::Model> for Project {
    fn from(m: project_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            domain: m.domain,
            created_at: m.created_at.into(),
        }
    }
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError> {
        let model = project_entity::ActiveModel {
            id: Set(project.id),
            name: Set(project.name.clone()),
            domain: Set(project.domain.clone()),
            created_at: Set(project.created_at.into()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(map_insert_error)?;
        Ok(project.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        let model = project_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
