// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor: the short-lived child process a daemon spawns once
//! promoted. [`Executor`] is the seam a daemon depends on, so tests drive
//! the state machine without ever forking a real process.

use actl_core::OutputStream;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// How to invoke the executor for one task.
#[derive(Debug, Clone)]
pub struct ExecutorSpec {
    /// First word is the program, the rest are fixed prefix arguments.
    pub command: String,
    pub prompt: String,
    pub workdir: std::path::PathBuf,
    pub identity_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorEvent {
    Output { stream: OutputStream, chunk: String },
    Exited { code: Option<i32>, signal: Option<i32> },
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to spawn executor: {0}")]
    Spawn(String),
}

/// A running executor. Dropping this without calling `terminate` leaves
/// the child to run to completion on its own.
pub struct ExecutorHandle {
    pub pid: Option<u32>,
    terminate_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl ExecutorHandle {
    pub fn new(pid: Option<u32>, terminate_tx: tokio::sync::oneshot::Sender<()>) -> Self {
        Self {
            pid,
            terminate_tx: Some(terminate_tx),
        }
    }

    /// Request termination (SIGTERM, escalating to SIGKILL after a grace
    /// period — see the concrete executor). Idempotent: a second call is a
    /// no-op.
    pub fn terminate(&mut self) {
        if let Some(tx) = self.terminate_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns and owns the executor child process for a task.
///
/// `events` receives an `Output` per chunk of stdout/stderr followed by
/// exactly one `Exited` when the child terminates.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn spawn(
        &self,
        spec: ExecutorSpec,
        events: mpsc::Sender<ExecutorEvent>,
    ) -> Result<ExecutorHandle, ExecutorError>;
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
