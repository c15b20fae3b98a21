// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_projects_and_sessions;
mod m20250301_000002_create_queue_items;
mod m20250301_000003_create_pages_issues_links;
mod m20250302_000001_create_indexes;

/// 数据库迁移器
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    /// 获取所有迁移
    ///
    /// # 返回值
    ///
    /// 返回按执行顺序排列的迁移列表
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_projects_and_sessions::Migration),
            Box::new(m20250301_000002_create_queue_items::Migration),
            Box::new(m20250301_000003_create_pages_issues_links::Migration),
            Box::new(m20250302_000001_create_indexes::Migration),
        ]
    }
}
