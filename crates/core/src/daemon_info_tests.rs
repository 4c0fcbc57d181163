// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn carries_the_expected_fields() {
    let info = DaemonInfo {
        agent_id: "a1".into(),
        name: "swarm-builder-000".into(),
        role: "builder".into(),
        state: DaemonState::Idle,
        current_task: None,
    };
    assert_eq!(info.state, DaemonState::Idle);
    assert!(info.current_task.is_none());
}
