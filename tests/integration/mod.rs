// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod api_test;
pub mod fixture_site_test;
pub mod helpers;
pub mod runtime_test;
pub mod scenarios_test;
pub mod sqlite_repository_test;
