// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon role and task-role matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The sentinel role that matches any task.
pub const GENERAL: &str = "general";

/// A daemon's role string, distinguished at the type level from other
/// free-form strings (component names, prompts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_general(&self) -> bool {
        self.0 == GENERAL
    }

    /// A daemon with `role = R != general` claims a task iff `task.role = R`.
    /// A daemon with `role = general` claims any task, including one with
    /// no role at all.
    pub fn matches(&self, task_role: Option<&str>) -> bool {
        if self.is_general() {
            return true;
        }
        task_role == Some(self.0.as_str())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::new("builder")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
