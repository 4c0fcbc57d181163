// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-slot daemon state machine: `idle → promoting → active →
//! demoting → idle`, plus the `crashed` terminal branch. No executor is
//! ever started without an explicit `approve_promotion` call from the
//! owning supervisor.

use crate::context_file;
use crate::executor::{Executor, ExecutorEvent, ExecutorSpec};
use actl_core::{Clock, DaemonEvent, DaemonInfo, DaemonState, Envelope, OutputStream, Role, Task};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Output retained for the completion context record; the rest is
/// forwarded live as `Output` events and discarded.
const OUTPUT_TAIL_CHARS: usize = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DaemonError {
    #[error("expected state {expected}, found {actual}")]
    WrongState {
        expected: DaemonState,
        actual: DaemonState,
    },
    #[error("promoting with no attached task")]
    MissingTask,
}

struct Inner {
    state: DaemonState,
    current_task: Option<Task>,
    output_tail: String,
    handle: Option<crate::executor::ExecutorHandle>,
    started_at: Option<Instant>,
}

/// A single fleet slot. Generic over the executor and clock so tests run
/// the full state machine against a [`crate::fake_executor::FakeExecutor`]
/// and an [`actl_core::FakeClock`] without spawning anything real.
pub struct Daemon<E: Executor, C: Clock> {
    agent_id: String,
    name: String,
    role: Role,
    executor: E,
    clock: C,
    executor_command: String,
    workdir: PathBuf,
    events: mpsc::Sender<DaemonEvent>,
    inner: Mutex<Inner>,
}

impl<E: Executor, C: Clock> Daemon<E, C> {
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        executor: E,
        clock: C,
        executor_command: impl Into<String>,
        workdir: PathBuf,
        events: mpsc::Sender<DaemonEvent>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            role,
            executor,
            clock,
            executor_command: executor_command.into(),
            workdir,
            events,
            inner: Mutex::new(Inner {
                state: DaemonState::Idle,
                current_task: None,
                output_tail: String::new(),
                handle: None,
                started_at: None,
            }),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn state(&self) -> DaemonState {
        self.inner.lock().state
    }

    pub fn current_task(&self) -> Option<Task> {
        self.inner.lock().current_task.clone()
    }

    /// How long the currently-running executor has been active, or `None`
    /// if this daemon isn't running one. Driven by the supervisor's
    /// `maxTaskDurationMs` watchdog (spec section 5).
    pub fn task_elapsed(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        inner
            .started_at
            .map(|started| self.clock.now().saturating_duration_since(started))
    }

    pub fn info(&self) -> DaemonInfo {
        let inner = self.inner.lock();
        DaemonInfo {
            agent_id: self.agent_id.clone(),
            name: self.name.clone(),
            role: self.role.as_str().to_string(),
            state: inner.state,
            current_task: inner.current_task.clone(),
        }
    }

    /// Emit a `heartbeat` event if, and only if, this daemon is currently
    /// `idle`. Driven externally by the supervisor's scheduler tick — see
    /// spec section 5's single-task-driven-scheduler model.
    pub async fn tick_heartbeat(&self) {
        if self.inner.lock().state == DaemonState::Idle {
            let _ = self
                .events
                .send(DaemonEvent::Heartbeat {
                    agent_id: self.agent_id.clone(),
                })
                .await;
        }
    }

    /// Route one inbound structured message. Spec section 4.D: evaluated
    /// only in the states each message type allows; everything else is a
    /// silent no-op.
    pub async fn handle_message(&self, envelope: Envelope) {
        match envelope {
            Envelope::TaskAvailable { task } => {
                let claim = {
                    let inner = self.inner.lock();
                    inner.state == DaemonState::Idle && self.role.matches(task.role.as_deref())
                };
                if claim {
                    let _ = self
                        .events
                        .send(DaemonEvent::Claim {
                            agent_id: self.agent_id.clone(),
                            component: task.component.clone(),
                            role: self.role.as_str().to_string(),
                        })
                        .await;
                }
            }
            Envelope::Assign { agent_id, task } => {
                if agent_id != self.agent_id {
                    return;
                }
                let promote = {
                    let mut inner = self.inner.lock();
                    if inner.state == DaemonState::Idle {
                        inner.state = DaemonState::Promoting;
                        inner.current_task = Some(task.clone());
                        true
                    } else {
                        false
                    }
                };
                if promote {
                    let _ = self
                        .events
                        .send(DaemonEvent::PromoteRequest {
                            agent_id: self.agent_id.clone(),
                            task,
                        })
                        .await;
                }
            }
            _ => {}
        }
    }

    /// Precondition: `state == Promoting`. Spawns the executor and, on
    /// success, transitions to `active`; on spawn failure, transitions to
    /// `crashed` and emits `fail` then `crashed`.
    pub async fn approve_promotion(self: &Arc<Self>) -> Result<(), DaemonError> {
        let task = {
            let inner = self.inner.lock();
            if inner.state != DaemonState::Promoting {
                return Err(DaemonError::WrongState {
                    expected: DaemonState::Promoting,
                    actual: inner.state,
                });
            }
            inner.current_task.clone()
        };
        let task = task.ok_or(DaemonError::MissingTask)?;

        context_file::write(
            &self.workdir,
            &context_file::promoting(
                &self.name,
                self.role.as_str(),
                task.prompt.as_deref().unwrap_or(""),
            ),
        );

        let spec = ExecutorSpec {
            command: self.executor_command.clone(),
            prompt: task.prompt.clone().unwrap_or_default(),
            workdir: self.workdir.clone(),
            identity_name: self.name.clone(),
        };
        let (tx, rx) = mpsc::channel(256);

        match self.executor.spawn(spec, tx).await {
            Ok(handle) => {
                let pid = handle.pid.unwrap_or(0);
                {
                    let mut inner = self.inner.lock();
                    inner.state = DaemonState::Active;
                    inner.output_tail.clear();
                    inner.handle = Some(handle);
                    inner.started_at = Some(self.clock.now());
                }
                let this = Arc::clone(self);
                tokio::spawn(async move { this.drive_executor(rx).await });
                let _ = self
                    .events
                    .send(DaemonEvent::Promoted {
                        agent_id: self.agent_id.clone(),
                        pid,
                    })
                    .await;
                Ok(())
            }
            Err(error) => {
                {
                    let mut inner = self.inner.lock();
                    inner.state = DaemonState::Crashed;
                }
                let message = error.to_string();
                context_file::write(&self.workdir, &context_file::crashed(&self.name, &message));
                let _ = self
                    .events
                    .send(DaemonEvent::Fail {
                        agent_id: self.agent_id.clone(),
                        task,
                        success: false,
                        exit_code: None,
                        error: Some(message.clone()),
                        output_len: 0,
                        duration_ms: 0,
                    })
                    .await;
                let _ = self
                    .events
                    .send(DaemonEvent::Crashed {
                        agent_id: self.agent_id.clone(),
                        error: message,
                    })
                    .await;
                Ok(())
            }
        }
    }

    /// Precondition: `state == Promoting`. Returns to `idle`.
    pub async fn deny_promotion(&self, reason: impl Into<String>) -> Result<(), DaemonError> {
        let reason = reason.into();
        {
            let mut inner = self.inner.lock();
            if inner.state != DaemonState::Promoting {
                return Err(DaemonError::WrongState {
                    expected: DaemonState::Promoting,
                    actual: inner.state,
                });
            }
            inner.state = DaemonState::Idle;
            inner.current_task = None;
        }
        let _ = self
            .events
            .send(DaemonEvent::Unclaim {
                agent_id: self.agent_id.clone(),
                reason,
            })
            .await;
        Ok(())
    }

    /// Ask the running executor to terminate. A no-op while not `active`.
    /// Used both by the shutdown path and the `maxTaskDurationMs`
    /// watchdog; either way the subsequent exit is handled as a normal
    /// (non-zero) completion, per spec section 5.
    pub fn terminate_executor(&self) {
        if let Some(handle) = self.inner.lock().handle.as_mut() {
            handle.terminate();
        }
    }

    async fn drive_executor(self: Arc<Self>, mut rx: mpsc::Receiver<ExecutorEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                ExecutorEvent::Output { stream, chunk } => {
                    {
                        let mut inner = self.inner.lock();
                        inner.output_tail.push_str(&chunk);
                        inner.output_tail.push('\n');
                        truncate_to_tail(&mut inner.output_tail, OUTPUT_TAIL_CHARS);
                    }
                    let _ = self
                        .events
                        .send(DaemonEvent::Output {
                            agent_id: self.agent_id.clone(),
                            stream,
                            chunk,
                        })
                        .await;
                }
                ExecutorEvent::Exited { code, signal } => {
                    self.on_exit(code, signal).await;
                    break;
                }
            }
        }
    }

    async fn on_exit(&self, code: Option<i32>, _signal: Option<i32>) {
        let (task, tail, duration_ms) = {
            let mut inner = self.inner.lock();
            inner.state = DaemonState::Demoting;
            inner.handle = None;
            let duration_ms = inner
                .started_at
                .map(|started| self.clock.now().saturating_duration_since(started).as_millis() as u64)
                .unwrap_or(0);
            inner.started_at = None;
            (inner.current_task.clone(), inner.output_tail.clone(), duration_ms)
        };
        let task = task.unwrap_or_default();
        let success = code == Some(0);
        let output_len = tail.len();

        context_file::write(
            &self.workdir,
            &context_file::completed(&self.name, success, code, &tail),
        );

        if success {
            let _ = self
                .events
                .send(DaemonEvent::Done {
                    agent_id: self.agent_id.clone(),
                    task,
                    success: true,
                    output_len,
                    duration_ms,
                })
                .await;
        } else {
            let _ = self
                .events
                .send(DaemonEvent::Fail {
                    agent_id: self.agent_id.clone(),
                    task,
                    success: false,
                    exit_code: code,
                    error: None,
                    output_len,
                    duration_ms,
                })
                .await;
        }

        {
            let mut inner = self.inner.lock();
            inner.state = DaemonState::Idle;
            inner.current_task = None;
        }
        let _ = self
            .events
            .send(DaemonEvent::Demoted {
                agent_id: self.agent_id.clone(),
            })
            .await;
    }
}

fn truncate_to_tail(buf: &mut String, max_chars: usize) {
    if buf.chars().count() <= max_chars {
        return;
    }
    let start_byte = buf
        .char_indices()
        .rev()
        .nth(max_chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    buf.drain(..start_byte);
}

/// Default watchdog period between a terminate request and the hard
/// SIGKILL escalation handled by the concrete executor.
pub const DEFAULT_MAX_TASK_DURATION: Duration = Duration::from_secs(1800);

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
