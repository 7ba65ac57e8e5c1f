// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::Context;
use clap::Parser;
use site_analyzer::app::{create_router, AppState, VERSION};
use site_analyzer::config::Config;
use site_analyzer::services::logging::init_tracing;
use site_analyzer::services::orchestrator::AnalysisOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let config = Config::parse();

    let orchestrator = AnalysisOrchestrator::from_config(&config)
        .context("failed to initialise analysis services")?;
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };
    let app = create_router(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        version = VERSION,
        %addr,
        pool_size = config.session_pool_size,
        classification = config.inference_url.is_some(),
        screenshots = config.screenshot_url.is_some(),
        "site-analyzer listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
