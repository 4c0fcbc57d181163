// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's typed event sink set.
//!
//! Re-architected from an event-emitter with duck-typed event names into a
//! closed set of event records per component. The supervisor subscribes
//! with a typed handler per event, which surfaces exhaustiveness to the
//! compiler instead of routing on event-name strings.

use crate::task::Task;

/// Events a `Daemon` publishes over its lifetime. Per daemon, lifecycle
/// events are totally ordered:
/// `Started`, then zero or more `Heartbeat`, then for each task:
/// `Claim?`, `PromoteRequest`, (`Promoted`|`Unclaim`), `Output*`,
/// (`Done`|`Fail`), `Demoted`.
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonEvent {
    Started {
        agent_id: String,
    },
    Stopped {
        agent_id: String,
    },
    Heartbeat {
        agent_id: String,
    },
    Claim {
        agent_id: String,
        component: Option<String>,
        role: String,
    },
    PromoteRequest {
        agent_id: String,
        task: Task,
    },
    Promoted {
        agent_id: String,
        pid: u32,
    },
    Unclaim {
        agent_id: String,
        reason: String,
    },
    Output {
        agent_id: String,
        stream: OutputStream,
        chunk: String,
    },
    Done {
        agent_id: String,
        task: Task,
        success: bool,
        output_len: usize,
        duration_ms: u64,
    },
    Fail {
        agent_id: String,
        task: Task,
        success: bool,
        exit_code: Option<i32>,
        error: Option<String>,
        output_len: usize,
        duration_ms: u64,
    },
    Demoted {
        agent_id: String,
    },
    Crashed {
        agent_id: String,
        error: String,
    },
    Error {
        agent_id: String,
        message: String,
    },
}

/// Which executor stream an `Output` event was forwarded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
