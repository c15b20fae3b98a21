// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 会话管理器与单会话运行时，以及请求DTO
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 抓取引擎：纯HTTP、浏览器渲染与按请求选择引擎的路由器
pub mod engines;

/// 基础设施模块
///
/// 提供数据库连接、仓库实现与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器与实时通道
pub mod presentation;

/// 队列模块
///
/// 单个会话的队列存储状态机
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 爬取工作器与按会话的工作器池
pub mod workers;
