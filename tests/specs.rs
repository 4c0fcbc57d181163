// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The literal end-to-end scenarios from the swarm supervisor
//! specification (S1-S6), exercised against the real crates rather than
//! any single crate's internal test fixtures.

use actl_adapters::{FakeIdentityProvider, FakeWorkspaceProvisioner};
use actl_bus::InProcessBus;
use actl_core::{Config, DaemonState, EstimationMode, FakeClock, Task};
use actl_daemon::{ExecutorEvent, FakeExecutor};
use actl_health::HealthMonitor;
use actl_quota::QuotaProbe;
use actl_supervisor::Supervisor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

type TestSupervisor = Supervisor<FakeExecutor, FakeClock>;

fn test_config(tmp: &TempDir) -> Config {
    Config {
        count: 3,
        max_active: 5,
        role: "general".to_string(),
        pidfile: tmp.path().join("swarm.pid"),
        log_dir: tmp.path().join("logs"),
        ..Config::default()
    }
}

fn build(config: Config) -> (Arc<TestSupervisor>, FakeExecutor, FakeClock) {
    let bus = Arc::new(InProcessBus::new());
    let identity = Arc::new(FakeIdentityProvider::new());
    let tmp_root = tempfile::tempdir().expect("tempdir");
    let workspace = Arc::new(FakeWorkspaceProvisioner::new(tmp_root.keep()));
    let clock = FakeClock::new();
    let executor = FakeExecutor::new();
    let supervisor = Supervisor::new(config, bus, identity, workspace, clock.clone(), executor.clone());
    (supervisor, executor, clock)
}

/// S1 - Admission with cap=1. count=3, maxActive=1. Assign a task to
/// daemon 0, then to daemon 1: daemon 0 becomes active, daemon 1 stays
/// `promoting` with its request queued. Completing daemon 0 admits
/// daemon 1 and drains the queue.
#[tokio::test]
async fn s1_admission_with_cap_one() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&tmp);
    config.count = 3;
    config.max_active = 1;
    let (sup, executor, _clock) = build(config);
    sup.start().await.expect("start");

    sup.broadcast_task(Task::new().with_component("task-0"))
        .await
        .expect("broadcast 0");
    tokio::time::sleep(Duration::from_millis(20)).await;

    sup.broadcast_task(Task::new().with_component("task-1"))
        .await
        .expect("broadcast 1");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let status = sup.status();
    assert_eq!(status.active, 1, "only one executor may be active under cap=1");
    assert_eq!(status.promoting, 1, "the second daemon stays promoting, not denied to idle");
    assert_eq!(status.queue_length, 1);
    assert_eq!(executor.call_count(), 1);

    let first_call = executor.calls().into_iter().next().expect("one spawn so far");
    first_call
        .events
        .send(ExecutorEvent::Exited { code: Some(0), signal: None })
        .await
        .expect("send exit");
    tokio::time::sleep(Duration::from_millis(30)).await;

    let status = sup.status();
    assert_eq!(status.active, 1, "the queued daemon is admitted once the slot frees");
    assert_eq!(status.queue_length, 0);
    assert_eq!(executor.call_count(), 2);

    sup.stop().await;
}

/// S2 - Budget exhaustion. budget=100, warningThreshold=0.8. First, the
/// quota probe in isolation: recording 85 tokens against a 100 budget
/// emits exactly one warning; a further 15 exhausts it. Then, wired into
/// a running supervisor, an already-exhausted probe causes a subsequent
/// assignment to be denied rather than promoted.
#[tokio::test]
async fn s2_budget_exhaustion_pauses_promotions() {
    let probe_only = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.8).with_budget(100);
    let now = std::time::Instant::now();
    let warning_events = probe_only.record(
        "agent-a",
        actl_quota::UsageReport { output_len: None, duration_ms: None, tokens: Some(85) },
        now,
    );
    assert_eq!(
        warning_events
            .iter()
            .filter(|e| matches!(e, actl_core::QuotaEvent::BudgetWarning { .. }))
            .count(),
        1,
        "85/100 should cross the 0.8 threshold exactly once"
    );
    let exhausted_events = probe_only.record(
        "agent-a",
        actl_quota::UsageReport { output_len: None, duration_ms: None, tokens: Some(15) },
        now,
    );
    assert!(exhausted_events
        .iter()
        .any(|e| matches!(e, actl_core::QuotaEvent::BudgetExhausted { .. })));
    assert!(probe_only.is_exhausted());

    // Now the supervisor side: a task's completion drives real usage
    // through the attached probe (chars_per_token=1 so output length maps
    // 1:1 to tokens), exhausting the same 100-token budget and pausing
    // promotions for the next assignment.
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&tmp);
    config.count = 2;
    config.max_active = 2;
    config.token_budget = 100;
    config.chars_per_token = 1;
    let (sup, executor, _clock) = build(config);
    let probe = Arc::new(QuotaProbe::new(EstimationMode::Output, 1, 50, 0.8).with_budget(100));
    sup.attach_quota(Arc::clone(&probe));
    sup.start().await.expect("start");

    sup.broadcast_task(Task::new().with_component("expensive-task"))
        .await
        .expect("broadcast");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let first_call = executor.calls().into_iter().next().expect("one spawn");
    first_call
        .events
        .send(ExecutorEvent::Output {
            stream: actl_core::OutputStream::Stdout,
            chunk: "x".repeat(150),
        })
        .await
        .expect("send output");
    first_call
        .events
        .send(ExecutorEvent::Exited { code: Some(0), signal: None })
        .await
        .expect("send exit");
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(probe.is_exhausted());
    assert!(sup.status().promotions_paused);

    sup.broadcast_task(Task::new().with_component("late-task"))
        .await
        .expect("broadcast second task");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.call_count(), 1, "promotion denied once the budget is exhausted");

    sup.stop().await;
}

/// S4 - Heartbeat to dead. heartbeatInterval=10ms, missThreshold=3.
/// Backdating `lastSeen` by 50ms and running `check()` reports `dead`
/// with exactly one `unresponsive` alert; further checks without a
/// heartbeat emit no more.
#[tokio::test]
async fn s4_heartbeat_escalates_to_dead_exactly_once() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock.clone(), Duration::from_millis(10), 3, None, None);

    monitor.register("agent-a", None);
    clock.advance(Duration::from_millis(50));

    let alerts = monitor.check();
    assert_eq!(alerts.len(), 1);
    assert!(matches!(&alerts[0], actl_core::HealthAlert::Unresponsive { agent_id } if agent_id == "agent-a"));
    assert_eq!(monitor.health_status("agent-a"), Some(actl_core::HealthStatus::Dead));

    let alerts = monitor.check();
    assert!(alerts.is_empty(), "the latch suppresses a repeat alert");
    let alerts = monitor.check();
    assert!(alerts.is_empty(), "still suppressed on a third check with no heartbeat");
}

/// S5 - Scale preserves active work. count=3, maxActive=3. Promoting
/// daemon 0 then scaling to 1 must remove the two idle daemons and leave
/// the active one in place.
#[tokio::test]
async fn s5_scale_down_preserves_the_active_daemon() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&tmp);
    config.count = 3;
    config.max_active = 3;
    let (sup, executor, _clock) = build(config);
    sup.start().await.expect("start");

    sup.broadcast_task(Task::new().with_component("keep-me-busy"))
        .await
        .expect("broadcast");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.call_count(), 1);

    let result = sup.scale(1).await.expect("scale down");
    assert_eq!(result.removed, 2);

    let status = sup.status();
    assert_eq!(status.total, 1);
    assert!(
        status.agents[0].state == DaemonState::Active || status.agents[0].state == DaemonState::Promoting,
        "the surviving daemon must be the one doing work, not an idle one"
    );

    sup.stop().await;
}

/// S6 - Stale pidfile takeover. A pidfile naming a non-existent PID must
/// not block `start()`.
#[tokio::test]
async fn s6_stale_pidfile_is_reclaimed() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = test_config(&tmp);
    std::fs::write(&config.pidfile, "999999999").expect("seed stale pidfile");

    let (sup, _executor, _clock) = build(config);
    sup.start().await.expect("start should reclaim a stale pidfile");
    assert!(sup.status().running);

    sup.stop().await;
}
