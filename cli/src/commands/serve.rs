// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Run the HTTP API with embedded services

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use gate_core::application::config::GateConfig;
use gate_core::presentation::api;

pub async fn handle_command(config_override: Option<PathBuf>) -> Result<()> {
    let config =
        GateConfig::load_or_default(config_override).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let addr = config.socket_addr()?;
    let app = api::app(config.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!(
        "{} {} listening on {}",
        "✓".green(),
        config.name.bold(),
        addr.to_string().cyan()
    );
    info!(%addr, "gate API started");

    axum::serve(listener, app).await.context("API server failed")
}
