// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Activity log commands
//!
//! Commands: list, clear

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::PathBuf;

use gate_core::application::config::GateConfig;
use gate_core::domain::log::LogStatus;

use crate::embedded::EmbeddedGate;

#[derive(Subcommand)]
pub enum LogsCommand {
    /// List the recorded executions, most recent first
    List {
        /// Emit raw JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Remove every recorded execution
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_command(command: LogsCommand, config_override: Option<PathBuf>) -> Result<()> {
    let config =
        GateConfig::load_or_default(config_override).context("Failed to load configuration")?;
    let gate = EmbeddedGate::build(config).await?;
    if gate.ephemeral {
        println!(
            "{}",
            "No data_dir configured; reading the in-memory store.".yellow()
        );
    }

    match command {
        LogsCommand::List { json } => list(&gate, json).await,
        LogsCommand::Clear { yes } => clear(&gate, yes).await,
    }
}

async fn list(gate: &EmbeddedGate, json: bool) -> Result<()> {
    let logs = gate.log_store.load().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }

    if logs.is_empty() {
        println!("No activity yet.");
        println!("Execute your first contract to see activity here.");
        return Ok(());
    }

    println!("{}", "Activity Log".bold());
    for log in &logs {
        let status = match log.status {
            LogStatus::Success => "success".green(),
            LogStatus::Failed => "failed".red(),
        };
        println!(
            "  {}  {}  {}  {}  {}",
            log.timestamp.format("%Y-%m-%d %H:%M:%S"),
            status,
            log.reference_id.to_string().cyan(),
            log.method.bold(),
            log.execution_hash
        );
        if let Some(error) = &log.error {
            println!("      {}", error.red());
        }
    }
    println!();
    println!("{} execution(s)", logs.len());
    Ok(())
}

async fn clear(gate: &EmbeddedGate, yes: bool) -> Result<()> {
    let count = gate.log_store.load().await.len();
    if count == 0 {
        println!("The activity log is already empty.");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove all {} recorded execution(s)?", count))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    gate.log_store
        .clear()
        .await
        .context("Failed to clear the activity log")?;
    println!("{} Cleared {} execution(s)", "✓".green(), count);
    Ok(())
}
