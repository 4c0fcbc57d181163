// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn write_overwrites_rather_than_appends() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "first");
    write(dir.path(), "second");
    let contents = std::fs::read_to_string(dir.path().join(CONTEXT_FILE_NAME)).unwrap();
    assert_eq!(contents, "second");
}

#[test]
fn write_to_a_missing_directory_does_not_panic() {
    write(std::path::Path::new("/nonexistent/workspace/path"), "x");
}

#[test]
fn templates_embed_their_inputs() {
    let text = promoting("swarm-builder-000", "builder", "fix the bug");
    assert!(text.contains("swarm-builder-000"));
    assert!(text.contains("fix the bug"));

    let text = completed("swarm-builder-000", true, Some(0), "ok");
    assert!(text.contains("done"));

    let text = crashed("swarm-builder-000", "spawn failed");
    assert!(text.contains("crashed"));
    assert!(text.contains("spawn failed"));
}
