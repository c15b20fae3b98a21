// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 项目（project）：被爬取的站点，只读引用
/// - 会话（session）：一次爬取运行及其配置快照
/// - 队列项（queue_item）：会话内的单个爬取目标
/// - 页面（page）、问题（issue）、页面链接（page_link）：爬取产出
/// - 汇总（summary）与事件（event）：派生的读模型
pub mod event;
pub mod issue;
pub mod page;
pub mod page_link;
pub mod project;
pub mod queue_item;
pub mod session;
pub mod summary;
