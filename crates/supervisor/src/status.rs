// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor's read-only status projection (spec section 4.E).

use actl_core::{DaemonState, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub agent_id: String,
    pub name: String,
    pub state: DaemonState,
    pub role: String,
    pub restart_count: u32,
    pub current_task: Option<Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub uptime_ms: u64,
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub promoting: usize,
    pub crashed: usize,
    pub promotions_paused: bool,
    pub queue_length: usize,
    pub agents: Vec<AgentStatus>,
}
