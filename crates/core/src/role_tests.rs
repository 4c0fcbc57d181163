// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    exact_match = { "builder", Some("builder"), true },
    mismatch = { "builder", Some("reviewer"), false },
    general_matches_anything = { "general", Some("builder"), true },
    general_matches_roleless = { "general", None, true },
    non_general_rejects_roleless = { "builder", None, false },
)]
fn role_matching(role: &str, task_role: Option<&str>, expected: bool) {
    assert_eq!(Role::new(role).matches(task_role), expected);
}

#[test]
fn default_role_is_builder() {
    assert_eq!(Role::default().as_str(), "builder");
}
