// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 会话生命周期编排：会话管理器、单会话运行时与接口DTO
pub mod dto;
pub mod errors;
pub mod session_manager;
pub mod session_runtime;
