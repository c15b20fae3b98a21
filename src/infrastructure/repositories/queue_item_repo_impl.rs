// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::columns::{map_insert_error, parse_column};
use crate::domain::models::queue_item::{QueueItem, QueueItemStatus};
use crate::domain::repositories::queue_item_repository::QueueItemRepository;
use crate::domain::repositories::session_repository::RepositoryError;
use crate::infrastructure::database::entities::queue_item as queue_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{sea_query::Expr, *};
use std::sync::Arc;
use uuid::Uuid;

/// 队列项仓库实现
///
/// 队列状态机在内存中运行，这里只负责把每次转换写入 `queue_items` 表留档。
pub struct QueueItemRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl QueueItemRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<queue_entity::Model> for QueueItem {
    type Error = RepositoryError;

    fn try_from(m: queue_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            session_id: m.session_id,
            url: m.url,
            depth: m.depth,
            status: parse_column("status", &m.status)?,
            attempt_count: m.attempt_count,
            discovered_from: m.discovered_from,
            seq: m.seq,
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
        })
    }
}

#[async_trait]
impl QueueItemRepository for QueueItemRepositoryImpl {
    async fn insert(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        let model = queue_entity::ActiveModel {
            id: Set(item.id),
            session_id: Set(item.session_id),
            url: Set(item.url.clone()),
            depth: Set(item.depth),
            status: Set(item.status.to_string()),
            attempt_count: Set(item.attempt_count),
            discovered_from: Set(item.discovered_from),
            seq: Set(item.seq),
            created_at: Set(item.created_at.into()),
            updated_at: Set(item.updated_at.into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn update(&self, item: &QueueItem) -> Result<(), RepositoryError> {
        let model = queue_entity::ActiveModel {
            id: Unchanged(item.id),
            status: Set(item.status.to_string()),
            attempt_count: Set(item.attempt_count),
            updated_at: Set(item.updated_at.into()),
            ..Default::default()
        };
        model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepositoryError::NotFound,
            other => RepositoryError::Database(other),
        })?;
        Ok(())
    }

    async fn cancel_pending(&self, session_id: Uuid) -> Result<u64, RepositoryError> {
        let result = queue_entity::Entity::update_many()
            .col_expr(
                queue_entity::Column::Status,
                Expr::value(QueueItemStatus::Cancelled.to_string()),
            )
            .col_expr(
                queue_entity::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(queue_entity::Column::SessionId.eq(session_id))
            .filter(queue_entity::Column::Status.eq(QueueItemStatus::Pending.to_string()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<QueueItem>, RepositoryError> {
        queue_entity::Entity::find()
            .filter(queue_entity::Column::SessionId.eq(session_id))
            .order_by_asc(queue_entity::Column::Seq)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(QueueItem::try_from)
            .collect()
    }
}
