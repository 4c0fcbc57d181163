// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Instant;

fn report(output_len: Option<usize>, duration_ms: Option<u64>, tokens: Option<u64>) -> UsageReport {
    UsageReport { output_len, duration_ms, tokens }
}

#[yare::parameterized(
    reported_uses_explicit_tokens = { EstimationMode::Reported, report(None, None, Some(42)), 42 },
    reported_zero_tokens_falls_back_to_output = {
        EstimationMode::Reported, report(Some(8), None, Some(0)), 2
    },
    output_estimates_from_length_rounding_up = { EstimationMode::Output, report(Some(9), None, None), 3 },
    duration_estimates_at_default_rate = {
        EstimationMode::Duration, report(None, Some(2000), None), 100
    },
    duration_with_no_duration_falls_back_to_output = {
        EstimationMode::Duration, report(Some(4), None, None), 1
    },
    no_input_at_all_records_zero = { EstimationMode::Output, report(None, None, None), 0 },
)]
fn estimation(mode: EstimationMode, report: UsageReport, expected_tokens: u64) {
    let probe = QuotaProbe::new(mode, 4, 50, 0.8);
    let events = probe.record("a1", report, Instant::now());
    assert_eq!(
        events[0],
        QuotaEvent::Usage {
            agent_id: "a1".to_string(),
            tokens: expected_tokens,
            total_tokens: expected_tokens,
        }
    );
}

#[test]
fn aggregate_and_per_agent_totals_accumulate() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.8);
    probe.record("a1", report(None, None, Some(10)), Instant::now());
    probe.record("a2", report(None, None, Some(5)), Instant::now());
    probe.record("a1", report(None, None, Some(7)), Instant::now());

    assert_eq!(probe.total_tokens(), 22);
    assert_eq!(probe.record_for("a1").unwrap().total_tokens, 17);
    assert_eq!(probe.record_for("a1").unwrap().tasks, 2);
    assert_eq!(probe.record_for("a2").unwrap().total_tokens, 5);
}

#[test]
fn budget_warning_then_exhaustion_matches_the_documented_scenario() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.8).with_budget(100);

    let events = probe.record("a", report(None, None, Some(85)), Instant::now());
    assert!(events
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetWarning { pct, .. } if (*pct - 85.0).abs() < 1e-6)));
    assert!(!events.iter().any(|e| matches!(e, QuotaEvent::BudgetExhausted { .. })));

    let events = probe.record("a", report(None, None, Some(15)), Instant::now());
    assert!(events
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetExhausted { total_tokens: 100, budget: 100 })));
    assert!(probe.is_exhausted());
}

#[test]
fn warning_fires_only_once_until_reset() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.5).with_budget(100);
    let first = probe.record("a", report(None, None, Some(60)), Instant::now());
    assert!(first
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetWarning { .. })));

    let second = probe.record("a", report(None, None, Some(1)), Instant::now());
    assert!(!second
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetWarning { .. })));
}

#[test]
fn set_budget_rearms_warning_latch_when_utilization_drops() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.5).with_budget(100);
    probe.record("a", report(None, None, Some(60)), Instant::now());

    probe.set_budget(1000);
    let events = probe.record("a", report(None, None, Some(10)), Instant::now());
    // Still under threshold at the new budget, so no warning should fire yet.
    assert!(!events
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetWarning { .. })));

    probe.set_budget(100);
    let events = probe.record("a", report(None, None, Some(0)), Instant::now());
    assert!(events
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetWarning { .. })));
}

#[test]
fn reset_clears_all_state() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.8).with_budget(100);
    probe.record("a", report(None, None, Some(90)), Instant::now());
    probe.reset();
    assert_eq!(probe.total_tokens(), 0);
    assert!(!probe.is_exhausted());
    assert!(probe.record_for("a").is_none());
}

#[test]
fn zero_budget_disables_gating() {
    let probe = QuotaProbe::new(EstimationMode::Reported, 4, 50, 0.8);
    let events = probe.record("a", report(None, None, Some(1_000_000)), Instant::now());
    assert!(!events
        .iter()
        .any(|e| matches!(e, QuotaEvent::BudgetExhausted { .. } | QuotaEvent::BudgetWarning { .. })));
    assert!(!probe.is_exhausted());
}
