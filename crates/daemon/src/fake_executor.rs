// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scripted [`Executor`] for driving the daemon state machine without
//! spawning a real process.

use crate::executor::{Executor, ExecutorEvent, ExecutorError, ExecutorHandle, ExecutorSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One recorded call to [`FakeExecutor::spawn`], including the event sink
/// the caller handed in — tests send synthetic [`ExecutorEvent`]s through
/// it to simulate output and exit.
#[derive(Clone)]
pub struct SpawnCall {
    pub spec: ExecutorSpec,
    pub events: mpsc::Sender<ExecutorEvent>,
    terminated: Arc<AtomicBool>,
}

impl SpawnCall {
    /// Whether the daemon requested termination of this call (e.g. the
    /// `maxTaskDurationMs` watchdog, or shutdown).
    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<SpawnCall>>>,
    next_result: Arc<Mutex<Option<Result<u32, String>>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `spawn` call fail instead of succeeding.
    pub fn fail_next_spawn(&self, reason: impl Into<String>) {
        *self.next_result.lock() = Some(Err(reason.into()));
    }

    pub fn calls(&self) -> Vec<SpawnCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn spawn(
        &self,
        spec: ExecutorSpec,
        events: mpsc::Sender<ExecutorEvent>,
    ) -> Result<ExecutorHandle, ExecutorError> {
        let terminated = Arc::new(AtomicBool::new(false));
        self.calls.lock().push(SpawnCall {
            spec,
            events: events.clone(),
            terminated: Arc::clone(&terminated),
        });

        if let Some(Err(reason)) = self.next_result.lock().take() {
            return Err(ExecutorError::Spawn(reason));
        }

        let (terminate_tx, terminate_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            if terminate_rx.await.is_ok() {
                terminated.store(true, Ordering::SeqCst);
            }
        });
        Ok(ExecutorHandle::new(Some(4242), terminate_tx))
    }
}

#[cfg(test)]
#[path = "fake_executor_tests.rs"]
mod tests;
