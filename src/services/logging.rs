// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Logging setup and helpers for keeping request data out of logs.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "site_analyzer=info,tower=warn";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

/// Redact a URL for logging.
/// Keeps scheme, host, port and path; drops credentials, query and fragment:
/// "https://u:p@shop.example.com/a?token=x" -> "https://shop.example.com/a"
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        // Not a URL, so there is no structure to keep
        Err(_) => "<unparseable url>".to_string(),
    }
}
