// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring for the production fleet: config loading, logging setup, and the
//! concrete adapter stack (`ProcessExecutor`, `SystemClock`,
//! `Ed25519IdentityProvider`, `DirWorkspaceProvisioner`, `InProcessBus`).

use actl_adapters::{DirWorkspaceProvisioner, Ed25519IdentityProvider};
use actl_bus::InProcessBus;
use actl_core::{Config, SystemClock};
use actl_daemon::ProcessExecutor;
use actl_supervisor::{StatusSnapshot, Supervisor};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

pub type ProdSupervisor = Supervisor<ProcessExecutor, SystemClock>;

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

pub fn build(config: Config) -> Result<Arc<ProdSupervisor>> {
    let workspace_root = config
        .pidfile
        .parent()
        .map(|dir| dir.join("workspaces"))
        .unwrap_or_else(|| std::path::PathBuf::from(".agentctl/workspaces"));

    let bus = Arc::new(InProcessBus::new());
    let identity = Arc::new(Ed25519IdentityProvider);
    let workspace = Arc::new(DirWorkspaceProvisioner::new(workspace_root));

    Ok(Supervisor::new(
        config,
        bus,
        identity,
        workspace,
        SystemClock,
        ProcessExecutor::new(),
    ))
}

/// Mirrors the teacher's `setup_logging`: a non-blocking rolling file
/// appender plus an `EnvFilter`, defaulting to `info`.
pub fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log directory {}", config.log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "agentctl.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

/// Waits for either SIGTERM or SIGINT (Ctrl-C).
pub async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return,
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

pub fn print_status(status: &StatusSnapshot) {
    println!(
        "running={} uptime_ms={} total={} active={} idle={} promoting={} crashed={} paused={} queue={}",
        status.running,
        status.uptime_ms,
        status.total,
        status.active,
        status.idle,
        status.promoting,
        status.crashed,
        status.promotions_paused,
        status.queue_length,
    );
    for agent in &status.agents {
        println!(
            "  {:<16} {:<10} role={:<10} restarts={} task={}",
            agent.name,
            format!("{:?}", agent.state).to_lowercase(),
            agent.role,
            agent.restart_count,
            agent
                .current_task
                .as_ref()
                .and_then(|t| t.component.clone())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}
