// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域仓库接口的具体实现与外部系统集成：
/// - 数据库（database）：连接池与 SeaORM 实体
/// - 仓库实现（repositories）：SeaORM 实现与进程内实现
/// - 指标（metrics）：Prometheus 导出
pub mod database;
pub mod metrics;
pub mod repositories;
