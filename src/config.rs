// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Service configuration. Every option has a default, so the service starts
//! without any flags or environment variables.

use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "site-analyzer")]
#[command(about = "Website analysis service", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: String,

    /// User agent sent with every outbound request
    #[arg(
        long,
        env = "USER_AGENT",
        default_value = concat!("site-analyzer/", env!("CARGO_PKG_VERSION"))
    )]
    pub user_agent: String,

    #[arg(long, env = "DIRECTIVE_TIMEOUT_SECS", default_value_t = 10)]
    pub directive_timeout_secs: u64,

    /// How long a fetched robots.txt is reused
    #[arg(long, env = "DIRECTIVE_CACHE_TTL_SECS", default_value_t = 3600)]
    pub directive_cache_ttl_secs: u64,

    #[arg(long, env = "PAGE_TIMEOUT_SECS", default_value_t = 15)]
    pub page_timeout_secs: u64,

    #[arg(long, env = "STAGE_TIMEOUT_SECS", default_value_t = 30)]
    pub stage_timeout_secs: u64,

    /// Upper bound for a whole analysis request
    #[arg(long, env = "REQUEST_DEADLINE_SECS", default_value_t = 60)]
    pub request_deadline_secs: u64,

    /// Maximum number of pages rendered at once, across all requests
    #[arg(long, env = "SESSION_POOL_SIZE", default_value_t = 8)]
    pub session_pool_size: usize,

    #[arg(long, env = "SESSION_ACQUIRE_TIMEOUT_SECS", default_value_t = 10)]
    pub session_acquire_timeout_secs: u64,

    /// Industry classification endpoint; classification degrades to a fixed label without it
    #[arg(long, env = "INFERENCE_URL")]
    pub inference_url: Option<String>,

    #[arg(long, env = "INFERENCE_TOKEN", hide_env_values = true)]
    pub inference_token: Option<String>,

    #[arg(long, env = "INFERENCE_TIMEOUT_SECS", default_value_t = 20)]
    pub inference_timeout_secs: u64,

    /// Screenshot rendering endpoint; the screenshot stage is skipped without it
    #[arg(long, env = "SCREENSHOT_URL")]
    pub screenshot_url: Option<String>,

    /// Candidate labels for zero-shot classification endpoints
    #[arg(long, env = "INDUSTRY_LABELS", value_delimiter = ',')]
    pub industry_labels: Vec<String>,
}

impl Config {
    pub fn directive_timeout(&self) -> Duration {
        Duration::from_secs(self.directive_timeout_secs)
    }

    pub fn directive_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.directive_cache_ttl_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn session_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.session_acquire_timeout_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Configured labels with blanks removed.
    pub fn candidate_labels(&self) -> Vec<String> {
        self.industry_labels
            .iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect()
    }
}
