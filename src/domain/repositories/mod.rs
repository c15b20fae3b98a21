// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供（SeaORM 与内存存储两套实现）。
///
/// 包含的仓库接口：
/// - 项目仓库（project_repository）：只读引用外部维护的项目
/// - 会话仓库（session_repository）：会话状态与计数器
/// - 队列项仓库（queue_item_repository）：队列项状态转换的持久化
/// - 页面仓库（page_repository）：页面、问题与链接的原子写入
/// - 问题仓库（issue_repository）：问题的过滤查询
/// - 统计仓库（analytics_repository）：汇总所需的快照读取
pub mod analytics_repository;
pub mod issue_repository;
pub mod page_repository;
pub mod project_repository;
pub mod queue_item_repository;
pub mod session_repository;
