// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates_long_strings() {
    let id = TestId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn short_leaves_short_strings_untouched() {
    let id = TestId::new("ab");
    assert_eq!(id.short(4), "ab");
}

#[test]
fn display_matches_inner_string() {
    let id = TestId::new("agent-1");
    assert_eq!(id.to_string(), "agent-1");
}

#[test]
fn sequential_id_gen_yields_distinct_ids() {
    let gen = SequentialIdGen::new("swarm");
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a, "swarm-1");
    assert_eq!(b, "swarm-2");
}

#[test]
fn uuid_id_gen_yields_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
