// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy returned by supervisor operations. Per-module
//! crates define their own narrower error enums and convert into this one
//! at the supervisor/CLI boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("supervisor is already running (pidfile {0:?})")]
    AlreadyRunning(std::path::PathBuf),

    #[error("supervisor is not running")]
    NotRunning,

    #[error("not connected to the message bus")]
    NotConnected,

    #[error("message bus failure: {0}")]
    BusFailure(String),

    #[error("failed to spawn executor: {0}")]
    ExecutorSpawnError(String),

    #[error("executor exited with status {0}")]
    ExecutorNonZeroExit(i32),

    #[error("agent {0} is unresponsive")]
    HealthUnresponsive(String),

    #[error("token budget exhausted ({used}/{budget})")]
    BudgetExhausted { used: u64, budget: u64 },

    #[error("failed to write workspace context for {agent_id}: {source}")]
    WorkspaceWriteFailure {
        agent_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
