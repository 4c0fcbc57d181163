// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process table and promotion queue — both owned exclusively by the
//! supervisor's serialized execution (spec section 9: never exposed by
//! reference to collaborators).

use actl_core::Task;
use actl_daemon::{Daemon, Executor};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// One process-table entry: a daemon plus the restart bookkeeping needed
/// for crash-recovery backoff and burst/degradation detection.
pub struct ProcessEntry<E: Executor, C: actl_core::Clock> {
    pub daemon: Arc<Daemon<E, C>>,
    pub restart_count: u32,
    pub first_restart_at: Option<Instant>,
    pub stable_since: Instant,
    pub restart_scheduled: bool,
    /// The daemon's workspace directory, torn down on scale-down/stop
    /// unless `persist` is configured. Owned here, not by the daemon,
    /// since teardown happens after the daemon itself is discarded.
    pub workdir: PathBuf,
}

impl<E: Executor, C: actl_core::Clock> ProcessEntry<E, C> {
    pub fn fresh(daemon: Arc<Daemon<E, C>>, now: Instant, workdir: PathBuf) -> Self {
        Self {
            daemon,
            restart_count: 0,
            first_restart_at: None,
            stable_since: now,
            restart_scheduled: false,
            workdir,
        }
    }
}

/// A pending promotion request, possibly stale by the time it is dequeued
/// (spec section 3: "Requests may be stale... drained lazily at dequeue").
#[derive(Debug, Clone)]
pub struct PromoteRequest {
    pub agent_id: String,
    pub task: Task,
}

pub type PromotionQueue = VecDeque<PromoteRequest>;
