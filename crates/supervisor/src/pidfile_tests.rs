// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn acquire_then_release_round_trips() {
    let dir = tempdir().unwrap();
    let pidfile = Pidfile::new(dir.path().join("swarm.pid"));
    let pid = std::process::id();
    pidfile.acquire(pid).unwrap();
    assert_eq!(pidfile.read(), Some(pid));
    pidfile.release(pid);
    assert!(!pidfile.path().exists());
}

#[test]
fn acquire_fails_when_a_live_process_holds_it() {
    let dir = tempdir().unwrap();
    let pidfile = Pidfile::new(dir.path().join("swarm.pid"));
    let pid = std::process::id();
    pidfile.acquire(pid).unwrap();

    let err = pidfile.acquire(pid + 1).unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyRunning(_)));
}

#[test]
fn acquire_overwrites_a_stale_pidfile() {
    let dir = tempdir().unwrap();
    let pidfile = Pidfile::new(dir.path().join("swarm.pid"));
    // PID unlikely to be alive in any test environment.
    std::fs::write(pidfile.path(), "999999").unwrap();
    let pid = std::process::id();
    pidfile.acquire(pid).unwrap();
    assert_eq!(pidfile.read(), Some(pid));
}

#[test]
fn release_is_a_no_op_if_the_pidfile_names_someone_else() {
    let dir = tempdir().unwrap();
    let pidfile = Pidfile::new(dir.path().join("swarm.pid"));
    let pid = std::process::id();
    pidfile.acquire(pid).unwrap();
    pidfile.release(pid + 1);
    assert!(pidfile.path().exists());
}
