// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供单个会话的队列存储状态机：去重、限额、按深度优先的领取顺序与重试预算
pub mod queue_store;
