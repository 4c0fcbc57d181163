// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::ExecutorSpec;

fn spec() -> ExecutorSpec {
    ExecutorSpec {
        command: "claude".to_string(),
        prompt: "do it".to_string(),
        workdir: "/tmp/ws".into(),
        identity_name: "swarm-builder-000".to_string(),
    }
}

#[tokio::test]
async fn records_spawn_calls() {
    let executor = FakeExecutor::new();
    let (tx, _rx) = mpsc::channel(8);
    executor.spawn(spec(), tx).await.unwrap();
    assert_eq!(executor.call_count(), 1);
    assert_eq!(executor.calls()[0].spec.prompt, "do it");
}

#[tokio::test]
async fn fail_next_spawn_surfaces_an_error() {
    let executor = FakeExecutor::new();
    executor.fail_next_spawn("boom");
    let (tx, _rx) = mpsc::channel(8);
    assert!(executor.spawn(spec(), tx).await.is_err());
}

#[tokio::test]
async fn injected_events_reach_the_caller() {
    let executor = FakeExecutor::new();
    let (tx, mut rx) = mpsc::channel(8);
    executor.spawn(spec(), tx).await.unwrap();

    let call = &executor.calls()[0];
    call.events
        .send(ExecutorEvent::Exited { code: Some(0), signal: None })
        .await
        .unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        ExecutorEvent::Exited { code: Some(0), signal: None }
    );
}
