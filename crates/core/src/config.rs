// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration: a single record with optional fields and
//! documented defaults, loadable from TOML and overridable by environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_count() -> usize {
    3
}
fn default_max_active() -> usize {
    5
}
fn default_role() -> String {
    "builder".to_string()
}
fn default_channels() -> Vec<String> {
    vec!["agents".to_string()]
}
fn default_heartbeat_interval_ms() -> u64 {
    30_000
}
fn default_max_task_duration_ms() -> u64 {
    1_800_000
}
fn default_pidfile() -> PathBuf {
    default_state_dir().join("swarm.pid")
}
fn default_log_dir() -> PathBuf {
    default_state_dir().join("logs")
}
fn default_shutdown_timeout_ms() -> u64 {
    10_000
}
fn default_warning_threshold() -> f64 {
    0.8
}
fn default_miss_threshold() -> u32 {
    3
}
fn default_chars_per_token() -> u64 {
    4
}
fn default_tokens_per_second() -> u64 {
    50
}
fn default_executor_command() -> String {
    "claude".to_string()
}

fn default_state_dir() -> PathBuf {
    dirs_state_dir().unwrap_or_else(|| PathBuf::from(".agentctl"))
}

fn dirs_state_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".agentctl"))
}

/// Supervisor configuration. Every field has a documented default; all are
/// optional when loading from TOML (`#[serde(default)]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial fleet size.
    pub count: usize,
    /// Admission cap for promoted executors.
    pub max_active: usize,
    /// Default daemon role.
    pub role: String,
    /// Channels joined on the bus.
    pub channels: Vec<String>,
    /// 0 disables budget gating.
    pub token_budget: u64,
    /// Idle heartbeat cadence and miss unit, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Executor watchdog, in milliseconds.
    pub max_task_duration_ms: u64,
    /// Keep workspaces on shutdown.
    pub persist: bool,
    /// Lock path.
    pub pidfile: PathBuf,
    /// Log directory.
    pub log_dir: PathBuf,
    /// Graceful-stop deadline, in milliseconds.
    pub shutdown_timeout_ms: u64,

    // Ambient additions beyond the distilled spec's configuration table.
    /// Fraction of the budget at which a `budget_warning` fires.
    pub warning_threshold: f64,
    /// Consecutive missed heartbeats before an agent is declared `dead`.
    pub miss_threshold: u32,
    /// Output-based token estimation divisor.
    pub chars_per_token: u64,
    /// Duration-based token estimation rate.
    pub tokens_per_second: u64,
    /// Optional RSS ceiling, in MB, before a `memory_limit` alert fires.
    pub memory_limit_mb: Option<f64>,
    /// Optional CPU ceiling, in percent, before a `cpu_limit` alert fires.
    pub cpu_limit_pct: Option<f64>,
    /// The AI-agent CLI invocation: first word is the program, the rest are
    /// prefix arguments. The daemon appends prompt/workdir/identity.
    pub executor_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            count: default_count(),
            max_active: default_max_active(),
            role: default_role(),
            channels: default_channels(),
            token_budget: 0,
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            max_task_duration_ms: default_max_task_duration_ms(),
            persist: false,
            pidfile: default_pidfile(),
            log_dir: default_log_dir(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            warning_threshold: default_warning_threshold(),
            miss_threshold: default_miss_threshold(),
            chars_per_token: default_chars_per_token(),
            tokens_per_second: default_tokens_per_second(),
            memory_limit_mb: None,
            cpu_limit_pct: None,
            executor_command: default_executor_command(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// any field the file omits. Missing file is not an error — a supervisor
    /// should be runnable with no configuration at all.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
