// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support;
use actl_core::Task;
use std::time::Duration;

#[tokio::test]
async fn promotion_beyond_the_cap_is_queued_not_denied_forever() {
    let mut config = test_support::test_config();
    config.max_active = 1;
    let (sup, _tmp, executor, _clock) = test_support::build(config);
    sup.start().await.expect("start");

    for i in 0..2 {
        sup.broadcast_task(Task::new().with_component(format!("c{i}")))
            .await
            .expect("broadcast");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // max_active is 1: exactly one daemon should have been promoted, the
    // other stays in `promoting` (not denied back to idle) with its
    // request queued rather than being lost.
    assert_eq!(executor.call_count(), 1);
    let status = sup.status();
    assert_eq!(status.queue_length, 1);
    assert_eq!(status.active, 1);
    assert_eq!(status.promoting, 1);

    sup.stop().await;
}

#[tokio::test]
async fn freeing_a_slot_drains_the_queued_promotion() {
    let mut config = test_support::test_config();
    config.max_active = 1;
    let (sup, _tmp, executor, _clock) = test_support::build(config);
    sup.start().await.expect("start");

    for i in 0..2 {
        sup.broadcast_task(Task::new().with_component(format!("c{i}")))
            .await
            .expect("broadcast");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(executor.call_count(), 1);

    let spawn = executor.calls().into_iter().next().expect("one spawn");
    spawn
        .events
        .send(actl_daemon::ExecutorEvent::Exited {
            code: Some(0),
            signal: None,
        })
        .await
        .expect("send exit");
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(
        executor.call_count(),
        2,
        "the queued promotion should drain once the slot frees up"
    );
    assert_eq!(sup.status().queue_length, 0);

    sup.stop().await;
}

#[tokio::test]
async fn budget_exhaustion_pauses_further_promotions() {
    use actl_quota::QuotaProbe;
    use std::sync::Arc;

    let mut config = test_support::test_config();
    config.max_active = 5;
    config.token_budget = 1;
    let (sup, _tmp, executor, _clock) = test_support::build(config);
    let probe = Arc::new(QuotaProbe::new(actl_core::EstimationMode::Output, 1, 50, 0.8).with_budget(1));
    sup.attach_quota(probe.clone());
    sup.start().await.expect("start");

    sup.broadcast_task(Task::new().with_component("only-task"))
        .await
        .expect("broadcast");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.call_count(), 1);

    let spawn = executor.calls().into_iter().next().expect("one spawn");
    spawn
        .events
        .send(actl_daemon::ExecutorEvent::Output {
            stream: actl_core::OutputStream::Stdout,
            chunk: "result".to_string(),
        })
        .await
        .expect("send output");
    spawn
        .events
        .send(actl_daemon::ExecutorEvent::Exited {
            code: Some(0),
            signal: None,
        })
        .await
        .expect("send exit");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(probe.is_exhausted());
    assert!(sup.status().promotions_paused);

    sup.broadcast_task(Task::new().with_component("second-task"))
        .await
        .expect("broadcast");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.call_count(), 1, "second promotion stays paused");

    sup.stop().await;
}
