// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub queue_item_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,
    pub status_code: Option<i32>,
    #[sea_orm(column_type = "Double")]
    pub load_time: f64,
    pub word_count: Option<i32>,
    pub depth: i32,
    pub meta: Json,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::seo_issue::Entity")]
    SeoIssue,
    #[sea_orm(has_many = "super::page_link::Entity")]
    PageLink,
}

impl Related<super::seo_issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeoIssue.def()
    }
}

impl Related<super::page_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PageLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
