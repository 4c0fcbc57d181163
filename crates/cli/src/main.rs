// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctl - thin CLI over the swarm supervisor.
//!
//! There is no separate daemon process and no IPC transport to one: each
//! subcommand builds a supervisor against the configured fleet, performs
//! its one operation, and tears the fleet back down before exiting. `start`
//! is the exception — it runs the fleet in the foreground until a signal
//! arrives.

mod fleet;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agentctl", version, about = "Swarm supervisor control")]
struct Cli {
    /// Path to a TOML config file (defaults applied for anything it omits)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fleet in the foreground until interrupted
    Start,
    /// Start the fleet, report its final status, then tear it down
    Stop,
    /// Start the fleet and print its status snapshot
    Status,
    /// Start the fleet, scale it to the given size, and report the result
    Scale {
        /// Target fleet size
        count: usize,
    },
    /// Start the fleet and broadcast one task to it
    Broadcast {
        /// Task role (matches a daemon's configured role, or leave unset for any role)
        #[arg(long)]
        role: Option<String>,
        /// Task prompt text
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = fleet::load_config(cli.config.as_deref())?;
    let _log_guard = fleet::setup_logging(&config)?;

    match cli.command {
        Commands::Start => run_foreground(config).await,
        Commands::Stop => run_once_then_stop(config).await,
        Commands::Status => run_status(config).await,
        Commands::Scale { count } => run_scale(config, count).await,
        Commands::Broadcast { role, prompt } => run_broadcast(config, role, prompt).await,
    }
}

async fn run_foreground(config: actl_core::Config) -> Result<()> {
    let supervisor = fleet::build(config)?;
    supervisor.start().await.context("failed to start supervisor")?;
    tracing::info!(event = "agentctl_ready", "supervisor running, waiting for shutdown signal");

    fleet::wait_for_shutdown_signal().await;

    tracing::info!(event = "agentctl_shutdown", "signal received, stopping supervisor");
    supervisor.stop().await;
    Ok(())
}

async fn run_once_then_stop(config: actl_core::Config) -> Result<()> {
    let supervisor = fleet::build(config)?;
    supervisor.start().await.context("failed to start supervisor")?;
    let status = supervisor.status();
    supervisor.stop().await;
    fleet::print_status(&status);
    Ok(())
}

async fn run_status(config: actl_core::Config) -> Result<()> {
    let supervisor = fleet::build(config)?;
    supervisor.start().await.context("failed to start supervisor")?;
    let status = supervisor.status();
    supervisor.stop().await;
    fleet::print_status(&status);
    Ok(())
}

async fn run_scale(config: actl_core::Config, count: usize) -> Result<()> {
    let supervisor = fleet::build(config)?;
    supervisor.start().await.context("failed to start supervisor")?;
    let result = supervisor.scale(count).await.context("failed to scale fleet")?;
    println!(
        "scaled {} -> {} (added {}, removed {})",
        result.from, result.to, result.added, result.removed
    );
    supervisor.stop().await;
    Ok(())
}

async fn run_broadcast(config: actl_core::Config, role: Option<String>, prompt: String) -> Result<()> {
    let supervisor = fleet::build(config)?;
    supervisor.start().await.context("failed to start supervisor")?;

    let mut task = actl_core::Task::new().with_prompt(prompt);
    if let Some(role) = role {
        task = task.with_role(role);
    }
    supervisor
        .broadcast_task(task)
        .await
        .context("failed to broadcast task")?;

    // Give the dispatcher one scheduling step to land the claim/assign
    // round trip before the snapshot below is taken.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let status = supervisor.status();
    supervisor.stop().await;
    fleet::print_status(&status);
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
