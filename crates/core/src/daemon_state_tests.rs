// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_state_is_idle() {
    assert_eq!(DaemonState::default(), DaemonState::Idle);
    assert!(DaemonState::default().is_idle());
}

#[test]
fn predicates_match_variant() {
    assert!(DaemonState::Active.is_active());
    assert!(!DaemonState::Promoting.is_active());
    assert!(DaemonState::Crashed.is_crashed());
}

#[test]
fn display_is_lowercase() {
    assert_eq!(DaemonState::Promoting.to_string(), "promoting");
}
