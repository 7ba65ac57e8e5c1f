// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod classification;
pub mod contact;
pub mod directive_policy;
pub mod directive_store;
pub mod extract;
pub mod logging;
pub mod orchestrator;
pub mod screenshot;
pub mod sentiment;
pub mod session_pool;
pub mod stages;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;
