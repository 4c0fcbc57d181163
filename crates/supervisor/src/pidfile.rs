// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor's pidfile: presence implies "may be running"; contents
//! are always checked against a live-process probe before being trusted.

use actl_core::SupervisorError;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};

pub struct Pidfile {
    path: PathBuf,
}

impl Pidfile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<u32> {
        std::fs::read_to_string(&self.path)
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    /// Spec section 4.E start() step 1: if the file names a live process,
    /// fail. If it names a dead one, overwrite (stale pidfile). Otherwise
    /// create it.
    pub fn acquire(&self, pid: u32) -> Result<(), SupervisorError> {
        if let Some(existing) = self.read() {
            if process_is_alive(existing) {
                return Err(SupervisorError::AlreadyRunning(self.path.clone()));
            }
            tracing::warn!(stale_pid = existing, "stale_pidfile");
        }
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(&self.path, pid.to_string())
            .map_err(|e| SupervisorError::InvalidConfig(format!("failed to write pidfile: {e}")))
    }

    /// Release the pidfile iff it still names `pid` — invariant I5.
    pub fn release(&self, pid: u32) {
        if self.read() == Some(pid) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn process_is_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
