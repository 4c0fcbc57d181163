// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The promotion admission controller: the gate between a daemon's
//! `promoting` state and an approved/denied transition out of it.

use crate::process_table::PromoteRequest;
use crate::supervisor::Supervisor;
use actl_core::{Clock, DaemonState};
use actl_daemon::Executor;

/// Spec section 4.E `_handlePromoteRequest`, in order:
/// 1. If promotions are paused, deny outright.
/// 2. If admission is already at `max_active`, queue the request — the
///    daemon stays `promoting` (spec section 4.E, step 2: "the daemon
///    stays in promoting"). It is neither approved nor denied.
/// 3. If a budget is configured and already exhausted, pause promotions
///    and deny.
/// 4. Otherwise approve.
pub(crate) async fn handle_promote_request<E, C>(supervisor: &Supervisor<E, C>, request: PromoteRequest)
where
    E: Executor + Clone,
    C: Clock,
{
    let Some(daemon) = supervisor.daemon_for(&request.agent_id) else {
        return;
    };

    let paused = supervisor.with_state(|s| s.promotions_paused());
    if paused {
        let _ = daemon.deny_promotion("promotions paused (budget/quota)").await;
        return;
    }

    let max_active = supervisor.config_snapshot().max_active;
    let at_cap = supervisor.with_state(|s| s.active_count() >= max_active);
    if at_cap {
        supervisor.with_state(|s| s.enqueue_promotion(request));
        return;
    }

    let budget = supervisor.config_snapshot().token_budget;
    if budget > 0 {
        let tokens_used = supervisor.with_state(|s| s.tokens_used());
        if tokens_used >= budget {
            supervisor.with_state(|s| s.set_promotions_paused(true));
            tracing::warn!(event = "promotions_paused", "token budget exhausted");
            let _ = daemon.deny_promotion("token budget exhausted").await;
            return;
        }
    }

    let _ = daemon.approve_promotion().await;
}

/// Spec section 4.E `_processPromotionQueue`: while the queue is
/// non-empty, `activeCount < maxActive`, and promotions are not paused,
/// dequeue the head. The queued daemon was never denied — it has been
/// sitting in `promoting` the whole time — so admission here is a direct
/// `approvePromotion`, not a re-offered `ASSIGN`. A request whose daemon
/// no longer exists, or has left `promoting` some other way, is discarded
/// and the loop continues (spec section 3, invariant I3).
pub(crate) async fn process_promotion_queue<E, C>(supervisor: &Supervisor<E, C>)
where
    E: Executor + Clone,
    C: Clock,
{
    loop {
        if supervisor.with_state(|s| s.promotions_paused()) {
            return;
        }
        let max_active = supervisor.config_snapshot().max_active;
        let active = supervisor.with_state(|s| s.active_count());
        if active >= max_active {
            return;
        }

        let Some(request) = supervisor.with_state(|s| s.pop_promotion()) else {
            return;
        };
        let Some(daemon) = supervisor.daemon_for(&request.agent_id) else {
            continue;
        };
        if daemon.state() != DaemonState::Promoting {
            continue;
        }
        let _ = daemon.approve_promotion().await;
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
