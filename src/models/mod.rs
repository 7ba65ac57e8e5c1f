// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod analysis;
pub mod api;
pub mod directive;
pub mod stage;
pub mod version;
