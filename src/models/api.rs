// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// `?url=` query parameter shared by every scraper endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UrlQuery {
    /// Target URL; comma-separated list for `status/summary`
    pub url: Option<String>,
}

/// Uniform error body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error_status: u16,
    pub error_code: String,
    pub error_message: String,
}
