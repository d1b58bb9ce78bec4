// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Contract Control Gate CLI
//!
//! The `cgate` binary drives the control gate from the terminal.
//!
//! ## Commands
//!
//! - `cgate serve` - Run the HTTP API with embedded services
//! - `cgate request` - Drive a full draft-to-log request pipeline
//! - `cgate logs list|clear` - Inspect or clear the activity log
//! - `cgate config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod embedded;

use commands::{request::RequestArgs, ConfigCommand, LogsCommand};

/// Contract Control Gate - policy-gated smart contract execution
#[derive(Parser)]
#[command(name = "cgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "GATE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API with embedded services
    #[command(name = "serve")]
    Serve,

    /// Drive a request through the full gate pipeline
    #[command(name = "request")]
    Request {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Activity log operations
    #[command(name = "logs")]
    Logs {
        #[command(subcommand)]
        command: LogsCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve) => commands::serve::handle_command(cli.config).await,
        Some(Commands::Request { args }) => {
            commands::request::handle_command(args, cli.config).await
        }
        Some(Commands::Logs { command }) => {
            commands::logs::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
