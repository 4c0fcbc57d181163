// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builder_methods_set_expected_fields() {
    let task = Task::new()
        .with_role("builder")
        .with_prompt("fix the bug")
        .with_component("parser");

    assert_eq!(task.role.as_deref(), Some("builder"));
    assert_eq!(task.prompt.as_deref(), Some("fix the bug"));
    assert_eq!(task.component.as_deref(), Some("parser"));
    assert_eq!(task.id, None);
}

#[test]
fn serializes_without_empty_optional_fields() {
    let task = Task::new().with_role("builder");
    let json = serde_json::to_value(&task).expect("serialize");
    assert_eq!(json, serde_json::json!({"role": "builder"}));
}
