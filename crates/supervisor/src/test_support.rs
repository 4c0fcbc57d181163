// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the supervisor's own unit tests. Not exported —
//! `actl-daemon`/`actl-bus`/`actl-adapters` each carry their own
//! `test-support` fakes, this module just wires them together.

#![cfg(test)]

use crate::supervisor::Supervisor;
use actl_adapters::{FakeIdentityProvider, FakeWorkspaceProvisioner};
use actl_bus::InProcessBus;
use actl_core::{Config, FakeClock};
use actl_daemon::FakeExecutor;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) type TestSupervisor = Supervisor<FakeExecutor, FakeClock>;

pub(crate) fn build(config: Config) -> (Arc<TestSupervisor>, TempDir, FakeExecutor, FakeClock) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let bus = Arc::new(InProcessBus::new());
    let identity = Arc::new(FakeIdentityProvider::new());
    let workspace = Arc::new(FakeWorkspaceProvisioner::new(tmp.path().to_path_buf()));
    let clock = FakeClock::new();
    let executor = FakeExecutor::new();

    let mut config = config;
    config.pidfile = tmp.path().join("swarm.pid");
    config.log_dir = tmp.path().join("logs");

    let supervisor = Supervisor::new(config, bus, identity, workspace, clock.clone(), executor.clone());
    (supervisor, tmp, executor, clock)
}

pub(crate) fn test_config() -> Config {
    Config {
        count: 2,
        max_active: 2,
        role: "general".to_string(),
        ..Config::default()
    }
}
