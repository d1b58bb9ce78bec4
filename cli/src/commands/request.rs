// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Drive a request through the full gate pipeline:
//! draft -> preview -> policy review -> wallet signature -> activity log.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::PathBuf;

use gate_core::application::config::GateConfig;
use gate_core::application::gate::GateError;
use gate_core::domain::events::GateEvent;
use gate_core::domain::request::ContractDraft;
use gate_core::infrastructure::event_bus::DomainEvent;

use crate::embedded::EmbeddedGate;

#[derive(Args)]
pub struct RequestArgs {
    /// Contract address (0x + 40 hex characters)
    #[arg(long)]
    pub address: String,

    /// Method name to invoke
    #[arg(long)]
    pub method: String,

    /// Call parameters as raw JSON text
    #[arg(long, default_value = "{}")]
    pub parameters: String,

    /// Reason for the request (minimum 10 characters)
    #[arg(long)]
    pub reason: String,

    /// Skip the preview confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn handle_command(args: RequestArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config =
        GateConfig::load_or_default(config_override).context("Failed to load configuration")?;
    let gate = EmbeddedGate::build(config).await?;
    if gate.ephemeral {
        println!(
            "{}",
            "No data_dir configured; this session's activity log will not persist.".yellow()
        );
    }

    if !gate.service.wallet().is_connected() {
        println!("Connecting wallet...");
        let session = gate
            .service
            .wallet()
            .connect()
            .await
            .context("Wallet connection failed")?;
        println!("{} Connected as {}", "✓".green(), session.username.bold());
    }

    // Draft + preview
    let draft = ContractDraft::new(&args.address, &args.method, &args.parameters, &args.reason);
    if let Err(e) = gate.service.submit_draft(draft).await {
        if let GateError::Validation(report) = &e {
            eprintln!("{}", "Draft rejected:".red().bold());
            for error in &report.errors {
                eprintln!("  {} {}: {}", "✗".red(), error.field, error.message);
            }
        }
        return Err(e).context("Draft failed validation");
    }

    println!();
    println!("{}", "Request Preview".bold());
    println!("  Contract:   {}", args.address.cyan());
    println!("  Method:     {}", args.method.cyan());
    println!("  Parameters: {}", args.parameters);
    println!("  Reason:     {}", args.reason);
    println!();

    if !args.yes {
        let proceed = Confirm::new()
            .with_prompt("Run policy checks and execute?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !proceed {
            println!("Aborted; the draft was not executed.");
            return Ok(());
        }
    }

    // Policy review
    let mut events = gate.event_bus.subscribe();
    gate.service.proceed_to_policy().await?;
    let result = gate.service.run_policy_checks().await?;

    println!("{}", "Policy Check".bold());
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::Gate(GateEvent::PolicyCheckEvaluated { name, passed, .. }) = event {
            let mark = if passed { "✓".green() } else { "✗".red() };
            println!("  {} {}", mark, name);
        }
    }

    if !result.passed {
        bail!("Cannot proceed with policy violations");
    }
    println!("  {}", "All checks passed".green());
    println!();

    // Freeze + sign + record
    let request = gate.service.forward_for_execution().await?;
    println!("Reference ID: {}", request.reference_id.to_string().bold());
    println!("Awaiting wallet signature...");

    match gate.service.execute().await {
        Ok(log) => {
            println!();
            println!("{} {}", "✓".green(), "Execution Successful".green().bold());
            println!("  Transaction ID: {}", log.execution_hash.cyan());
            println!("  Method:         {}", log.method);
            println!("  Timestamp:      {}", log.timestamp.to_rfc3339());
            if let Some(gas) = &log.gas_used {
                println!("  Gas Used:       {}", gas);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "✗".red(), "Execution Failed".red().bold());
            eprintln!("  {}", e);
            eprintln!("  The request was not recorded; start a new one to retry.");
            Err(e).context("Execution failed")
        }
    }
}
