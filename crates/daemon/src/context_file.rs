// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-workspace context file: a plain-text, human-readable summary
//! overwritten on every state transition worth recording. Never
//! machine-parsed, and never allowed to fail the daemon.

use std::path::Path;

pub const CONTEXT_FILE_NAME: &str = "CONTEXT.md";

/// Overwrite the workspace's context file. Failures are logged and
/// swallowed — see spec section 4.D: "context is best-effort and must
/// never fail the daemon."
pub fn write(workdir: &Path, contents: &str) {
    let path = workdir.join(CONTEXT_FILE_NAME);
    if let Err(error) = std::fs::write(&path, contents) {
        tracing::warn!(path = %path.display(), %error, "failed to write workspace context");
    }
}

pub fn promoting(identity_name: &str, role: &str, prompt: &str) -> String {
    format!(
        "# {identity_name}\n\nstatus: promoted\nrole: {role}\n\n## task\n\n{prompt}\n"
    )
}

pub fn completed(identity_name: &str, success: bool, exit_code: Option<i32>, tail: &str) -> String {
    let result = if success { "done" } else { "failed" };
    format!(
        "# {identity_name}\n\nstatus: {result}\nexit_code: {exit_code:?}\n\n## output (tail)\n\n{tail}\n"
    )
}

pub fn crashed(identity_name: &str, error: &str) -> String {
    format!("# {identity_name}\n\nstatus: crashed\nerror: {error}\n")
}

#[cfg(test)]
#[path = "context_file_tests.rs"]
mod tests;
