// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace provisioning: the per-daemon directory a daemon owns
//! exclusively for the life of its record. Creation happens at spawn time;
//! teardown happens on stop/scale-down/crash-replace, unless `persist` is
//! configured.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to provision workspace at {path}: {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to tear down workspace at {path}: {source}")]
    Teardown {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Creates and removes the directory a daemon's executor runs in.
pub trait WorkspaceProvisioner: Send + Sync + 'static {
    fn provision(&self, name: &str) -> Result<PathBuf, WorkspaceError>;
    fn teardown(&self, path: &Path) -> Result<(), WorkspaceError>;
}

/// Provisions workspaces as subdirectories of a configured root.
pub struct DirWorkspaceProvisioner {
    root: PathBuf,
}

impl DirWorkspaceProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WorkspaceProvisioner for DirWorkspaceProvisioner {
    fn provision(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.root.join(name);
        std::fs::create_dir_all(&path).map_err(|source| WorkspaceError::Provision {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn teardown(&self, path: &Path) -> Result<(), WorkspaceError> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkspaceError::Teardown {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Records provision/teardown calls without touching the filesystem beyond
/// a shared scratch root, so tests can assert on workspace lifecycle
/// without depending on real directory creation timing.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeWorkspaceProvisioner {
    root: PathBuf,
    provisioned: parking_lot::Mutex<Vec<String>>,
    torn_down: parking_lot::Mutex<Vec<PathBuf>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeWorkspaceProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            provisioned: parking_lot::Mutex::new(Vec::new()),
            torn_down: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn provisioned(&self) -> Vec<String> {
        self.provisioned.lock().clone()
    }

    pub fn torn_down(&self) -> Vec<PathBuf> {
        self.torn_down.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl WorkspaceProvisioner for FakeWorkspaceProvisioner {
    fn provision(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        self.provisioned.lock().push(name.to_string());
        let path = self.root.join(name);
        std::fs::create_dir_all(&path).map_err(|source| WorkspaceError::Provision {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn teardown(&self, path: &Path) -> Result<(), WorkspaceError> {
        self.torn_down.lock().push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
