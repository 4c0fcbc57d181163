// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery: restart backoff, burst detection, and the degraded
//! state a fleet slot enters after restarting too many times too fast.

use crate::supervisor::Supervisor;
use actl_core::Clock;
use actl_daemon::Executor;
use std::time::Duration;

const BURST_RESET: Duration = Duration::from_secs(5 * 60);
const DEGRADATION_WINDOW: Duration = Duration::from_secs(30 * 60);
const DEGRADATION_THRESHOLD: u32 = 5;
const MAX_BACKOFF_SECS: u64 = 300;

fn backoff_for(restart_count: u32) -> Duration {
    let secs = 2u64.saturating_pow(restart_count).min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

/// Spec section 4.E `_handleCrash`. Idempotent per crash: a slot already
/// scheduled for restart is left alone rather than double-scheduled.
pub(crate) async fn handle_crash<E, C>(supervisor: &Supervisor<E, C>, agent_id: String, error: String)
where
    E: Executor + Clone,
    C: Clock,
{
    tracing::warn!(%agent_id, %error, event = "crashed");

    let already_scheduled = supervisor.with_state(|s| {
        s.restart_entry(&agent_id)
            .map(|entry| entry.restart_scheduled)
            .unwrap_or(true)
    });
    if already_scheduled {
        return;
    }

    let now = supervisor.clock().now();
    let (name, role_str, restart_count, first_restart_at, degraded) = supervisor.with_state(|s| {
        let entry = match s.restart_entry(&agent_id) {
            Some(entry) => entry,
            None => return (String::new(), String::new(), 0, None, false),
        };
        entry.restart_scheduled = true;

        if now.saturating_duration_since(entry.stable_since) > BURST_RESET {
            entry.restart_count = 0;
            entry.first_restart_at = None;
        }

        entry.restart_count += 1;
        let first_restart_at = *entry.first_restart_at.get_or_insert(now);

        let degraded = entry.restart_count > DEGRADATION_THRESHOLD
            && now.saturating_duration_since(first_restart_at) <= DEGRADATION_WINDOW;

        let daemon_info = entry.daemon.info();
        (
            daemon_info.name,
            daemon_info.role,
            entry.restart_count,
            Some(first_restart_at),
            degraded,
        )
    });

    if name.is_empty() {
        return;
    }

    if degraded {
        supervisor.with_state(|s| {
            if let Some(entry) = s.restart_entry(&agent_id) {
                entry.restart_scheduled = false;
            }
        });
        tracing::warn!(
            %agent_id,
            restart_count,
            event = "degraded",
            "slot degraded after repeated crashes, giving up on restart; entry left in place for inspection"
        );
        return;
    }

    let delay = backoff_for(restart_count);
    tracing::info!(%agent_id, delay_secs = delay.as_secs(), event = "restart_scheduled");
    tokio::time::sleep(delay).await;

    let old = supervisor.with_state(|s| s.remove(&agent_id));
    let persist = supervisor.config_snapshot().persist;
    if let Some(entry) = old {
        supervisor.health().unregister(&agent_id);
        if !persist {
            if let Err(error) = supervisor.workspace_provisioner().teardown(&entry.workdir) {
                tracing::warn!(%error, %agent_id, "failed to tear down crashed workspace");
            }
        }
    }

    if !supervisor.is_running() {
        return;
    }

    let new_agent_id = supervisor
        .spawn_replacement(name, role_str, restart_count, first_restart_at)
        .await;
    tracing::info!(
        old_agent_id = %agent_id,
        new_agent_id = %new_agent_id,
        event = "restarted",
        "replacement daemon spawned"
    );
}

#[cfg(test)]
#[path = "crash_tests.rs"]
mod tests;
