// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A read-only snapshot of one daemon's identity and current state, as
//! surfaced by `Daemon::info()` and folded into the supervisor's status
//! projection (which adds process-table-owned fields like `restart_count`).

use crate::{DaemonState, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonInfo {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub state: DaemonState,
    pub current_task: Option<Task>,
}

#[cfg(test)]
#[path = "daemon_info_tests.rs"]
mod tests;
