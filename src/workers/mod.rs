// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 每个活跃会话拥有固定数量的爬取工作器：
/// - 爬取工作器（crawl_worker）：领取 → 抓取 → 分析 → 完成 的管线
/// - 主机节流（host_pacer）：会话级的按主机请求间隔
/// - 工作器池（pool）：按会话拉起与回收工作器
pub mod crawl_worker;
pub mod host_pacer;
pub mod pool;

pub use pool::WorkerPool;
