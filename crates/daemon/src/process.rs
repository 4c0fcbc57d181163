// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real [`Executor`]: spawns the configured AI-agent CLI as a child
//! process, streams its stdout/stderr as events, and escalates SIGTERM to
//! SIGKILL on a termination request the child doesn't honor promptly.

use crate::executor::{Executor, ExecutorEvent, ExecutorError, ExecutorHandle, ExecutorSpec};
use actl_core::OutputStream;
use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Grace period between SIGTERM and SIGKILL when a termination is
/// requested and the child does not exit on its own.
const TERM_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_command(spec: &ExecutorSpec) -> Result<Command, ExecutorError> {
    let mut parts = spec.command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ExecutorError::Spawn("empty executor command".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(parts);
    cmd.arg(&spec.prompt);
    cmd.arg(&spec.workdir);
    cmd.arg(&spec.identity_name);
    cmd.current_dir(&spec.workdir);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.stdin(std::process::Stdio::null());
    cmd.kill_on_drop(true);
    Ok(cmd)
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn spawn(
        &self,
        spec: ExecutorSpec,
        events: mpsc::Sender<ExecutorEvent>,
    ) -> Result<ExecutorHandle, ExecutorError> {
        let mut cmd = build_command(&spec)?;
        let mut child = cmd
            .spawn()
            .map_err(|e| ExecutorError::Spawn(e.to_string()))?;
        let pid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if let Some(stdout) = stdout {
            spawn_line_forwarder(stdout, OutputStream::Stdout, events.clone());
        }
        if let Some(stderr) = stderr {
            spawn_line_forwarder(stderr, OutputStream::Stderr, events.clone());
        }

        let (terminate_tx, terminate_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let exit = wait_with_termination(&mut child, pid, terminate_rx).await;
            let _ = events.send(ExecutorEvent::Exited {
                code: exit.0,
                signal: exit.1,
            }).await;
        });

        Ok(ExecutorHandle::new(pid, terminate_tx))
    }
}

fn spawn_line_forwarder<R>(reader: R, stream: OutputStream, events: mpsc::Sender<ExecutorEvent>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if events
                .send(ExecutorEvent::Output {
                    stream,
                    chunk: line,
                })
                .await
                .is_err()
            {
                break;
            }
        }
    });
}

async fn wait_with_termination(
    child: &mut tokio::process::Child,
    pid: Option<u32>,
    terminate_rx: tokio::sync::oneshot::Receiver<()>,
) -> (Option<i32>, Option<i32>) {
    tokio::select! {
        status = child.wait() => exit_parts(status),
        _ = terminate_rx => {
            if let Some(pid) = pid {
                let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
            match tokio::time::timeout(TERM_GRACE, child.wait()).await {
                Ok(status) => exit_parts(status),
                Err(_elapsed) => {
                    if let Some(pid) = pid {
                        let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
                    }
                    exit_parts(child.wait().await)
                }
            }
        }
    }
}

#[cfg(unix)]
fn exit_parts(status: std::io::Result<std::process::ExitStatus>) -> (Option<i32>, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;
    match status {
        Ok(status) => (status.code(), status.signal()),
        Err(_) => (None, None),
    }
}

#[cfg(not(unix))]
fn exit_parts(status: std::io::Result<std::process::ExitStatus>) -> (Option<i32>, Option<i32>) {
    match status {
        Ok(status) => (status.code(), None),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
