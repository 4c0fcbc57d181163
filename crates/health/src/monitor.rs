// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat tracking and liveness classification for a fleet of daemons.
//!
//! The monitor never signals or kills a process — it only classifies and
//! alerts. Acting on a `dead` classification (demoting, restarting) is the
//! supervisor's job.

use crate::proc_sample;
use actl_core::{Clock, HealthAlert, HealthRecord, HealthStatus, HealthSummary};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Tracks heartbeats and resource usage for every registered agent.
pub struct HealthMonitor<C: Clock> {
    clock: C,
    records: Mutex<HashMap<String, HealthRecord>>,
    heartbeat_interval: Mutex<Duration>,
    miss_threshold: u32,
    memory_limit_mb: Option<f64>,
    cpu_limit_pct: Option<f64>,
}

impl<C: Clock> HealthMonitor<C> {
    pub fn new(
        clock: C,
        heartbeat_interval: Duration,
        miss_threshold: u32,
        memory_limit_mb: Option<f64>,
        cpu_limit_pct: Option<f64>,
    ) -> Self {
        Self {
            clock,
            records: Mutex::new(HashMap::new()),
            heartbeat_interval: Mutex::new(heartbeat_interval),
            miss_threshold,
            memory_limit_mb,
            cpu_limit_pct,
        }
    }

    /// Update the heartbeat cadence / miss unit used by `check()`, e.g.
    /// after a `reloadConfig` changes `heartbeatIntervalMs`.
    pub fn set_heartbeat_interval(&self, interval: Duration) {
        *self.heartbeat_interval.lock() = interval;
    }

    /// Begin tracking an agent. Re-registering resets its record.
    pub fn register(&self, agent_id: &str, pid: Option<i32>) {
        let now = self.clock.now();
        self.records
            .lock()
            .insert(agent_id.to_string(), HealthRecord::new(now, pid));
    }

    pub fn unregister(&self, agent_id: &str) {
        self.records.lock().remove(agent_id);
    }

    /// Attach (or change) the OS pid resource sampling reads from, e.g.
    /// once an executor has actually spawned.
    pub fn update_pid(&self, agent_id: &str, pid: Option<i32>) {
        if let Some(record) = self.records.lock().get_mut(agent_id) {
            record.pid = pid;
        }
    }

    /// Record a heartbeat: resets the miss counter, re-arms the one-shot
    /// `unresponsive` alert, and reclassifies as alive.
    pub fn heartbeat(&self, agent_id: &str) {
        let now = self.clock.now();
        if let Some(record) = self.records.lock().get_mut(agent_id) {
            record.last_seen = now;
            record.consecutive_misses = 0;
            record.status = HealthStatus::Alive;
            record.unresponsive_alert_latched = false;
        }
    }

    pub fn health_status(&self, agent_id: &str) -> Option<HealthStatus> {
        self.records.lock().get(agent_id).map(|r| r.status)
    }

    pub fn health_summary(&self, agent_id: &str) -> Option<HealthSummary> {
        self.records.lock().get(agent_id).map(|r| HealthSummary {
            agent_id: agent_id.to_string(),
            status: r.status,
            consecutive_misses: r.consecutive_misses,
            pid: r.pid,
            memory_mb: r.memory_mb,
            cpu_pct: r.cpu_pct,
        })
    }

    pub fn all_summaries(&self) -> Vec<HealthSummary> {
        self.records
            .lock()
            .iter()
            .map(|(agent_id, r)| HealthSummary {
                agent_id: agent_id.clone(),
                status: r.status,
                consecutive_misses: r.consecutive_misses,
                pid: r.pid,
                memory_mb: r.memory_mb,
                cpu_pct: r.cpu_pct,
            })
            .collect()
    }

    /// Advance every record: count missed heartbeat windows since
    /// `last_seen`, reclassify, sample resource usage, and return any
    /// alerts this pass produced.
    ///
    /// `unresponsive` fires exactly once per miss streak (latched on the
    /// record and cleared by the next heartbeat); `memory_limit` and
    /// `cpu_limit` re-fire every pass the limit is exceeded.
    pub fn check(&self) -> Vec<HealthAlert> {
        let now = self.clock.now();
        let mut alerts = Vec::new();
        let mut records = self.records.lock();
        let heartbeat_interval = *self.heartbeat_interval.lock();

        for (agent_id, record) in records.iter_mut() {
            let elapsed = now.saturating_duration_since(record.last_seen);
            record.consecutive_misses = (elapsed.as_millis()
                / heartbeat_interval.as_millis().max(1))
            .min(u32::MAX as u128) as u32;

            if record.consecutive_misses >= self.miss_threshold {
                record.status = HealthStatus::Dead;
                if !record.unresponsive_alert_latched {
                    record.unresponsive_alert_latched = true;
                    alerts.push(HealthAlert::Unresponsive {
                        agent_id: agent_id.clone(),
                    });
                }
            } else if record.consecutive_misses >= 1 {
                record.status = HealthStatus::Unresponsive;
            } else {
                record.status = HealthStatus::Alive;
            }

            if let Some(pid) = record.pid {
                if let Some(sample) = proc_sample::sample(pid) {
                    record.memory_mb = Some(sample.memory_mb);
                    record.cpu_pct = Some(sample.cpu_pct);

                    if let Some(limit) = self.memory_limit_mb {
                        if sample.memory_mb > limit {
                            alerts.push(HealthAlert::MemoryLimit {
                                agent_id: agent_id.clone(),
                                memory_mb: sample.memory_mb,
                            });
                        }
                    }
                    if let Some(limit) = self.cpu_limit_pct {
                        if sample.cpu_pct > limit {
                            alerts.push(HealthAlert::CpuLimit {
                                agent_id: agent_id.clone(),
                                cpu_pct: sample.cpu_pct,
                            });
                        }
                    }
                }
            }
        }

        alerts
    }
}

/// Shared-ownership handle so the monitor can be read from the supervisor
/// loop and written from each daemon's heartbeat task concurrently.
pub type SharedHealthMonitor<C> = Arc<HealthMonitor<C>>;

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
