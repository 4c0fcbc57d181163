// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent and aggregate token accounting against an optional budget.

use actl_core::{AggregateQuota, EstimationMode, QuotaEvent, QuotaRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

/// A single usage report to be accounted, as supplied by a daemon on task
/// completion. Which field matters depends on the probe's
/// [`EstimationMode`]; see [`QuotaProbe::record`].
#[derive(Debug, Clone, Default)]
pub struct UsageReport {
    pub output_len: Option<usize>,
    pub duration_ms: Option<u64>,
    pub tokens: Option<u64>,
}

pub struct QuotaProbe {
    mode: EstimationMode,
    chars_per_token: u64,
    tokens_per_second: u64,
    warning_threshold: f64,
    state: Mutex<State>,
}

struct State {
    records: HashMap<String, QuotaRecord>,
    aggregate: AggregateQuota,
}

impl QuotaProbe {
    pub fn new(
        mode: EstimationMode,
        chars_per_token: u64,
        tokens_per_second: u64,
        warning_threshold: f64,
    ) -> Self {
        Self {
            mode,
            chars_per_token: chars_per_token.max(1),
            tokens_per_second,
            warning_threshold,
            state: Mutex::new(State {
                records: HashMap::new(),
                aggregate: AggregateQuota::default(),
            }),
        }
    }

    pub fn with_budget(self, budget: u64) -> Self {
        self.state.lock().aggregate.budget = budget;
        self
    }

    fn estimate(&self, report: &UsageReport) -> u64 {
        let by_output = || {
            report
                .output_len
                .map(|len| len.div_ceil(self.chars_per_token as usize) as u64)
        };
        let primary = match self.mode {
            EstimationMode::Reported => report.tokens.filter(|t| *t > 0),
            EstimationMode::Output => by_output(),
            EstimationMode::Duration => report
                .duration_ms
                .map(|ms| ms.div_ceil(1000) * self.tokens_per_second),
        };
        primary.or_else(by_output).unwrap_or(0)
    }

    /// Record usage for `agent_id`. Always emits `usage`; additionally
    /// emits at most one of `budget_exhausted` (total has reached budget,
    /// may repeat across records) or `budget_warning` (crossing the
    /// threshold for the first time since the latch was last cleared).
    pub fn record(&self, agent_id: &str, report: UsageReport, now: Instant) -> Vec<QuotaEvent> {
        let tokens = self.estimate(&report);
        let mut state = self.state.lock();

        let record = state.records.entry(agent_id.to_string()).or_default();
        record.total_tokens += tokens;
        record.tasks += 1;
        record.last_task = Some(now);

        state.aggregate.total_tokens += tokens;
        let total = state.aggregate.total_tokens;
        let budget = state.aggregate.budget;

        let mut events = vec![QuotaEvent::Usage {
            agent_id: agent_id.to_string(),
            tokens,
            total_tokens: total,
        }];

        if budget > 0 {
            if total >= budget {
                events.push(QuotaEvent::BudgetExhausted {
                    total_tokens: total,
                    budget,
                });
            } else if total as f64 >= self.warning_threshold * budget as f64
                && !state.aggregate.warning_emitted
            {
                state.aggregate.warning_emitted = true;
                let pct = (total as f64 / budget as f64) * 100.0;
                events.push(QuotaEvent::BudgetWarning {
                    total_tokens: total,
                    budget,
                    pct,
                });
            }
        }

        events
    }

    pub fn total_tokens(&self) -> u64 {
        self.state.lock().aggregate.total_tokens
    }

    pub fn is_exhausted(&self) -> bool {
        let state = self.state.lock();
        state.aggregate.budget > 0 && state.aggregate.total_tokens >= state.aggregate.budget
    }

    pub fn record_for(&self, agent_id: &str) -> Option<QuotaRecord> {
        self.state.lock().records.get(agent_id).cloned()
    }

    /// Update the budget. If the new utilization drops below the warning
    /// threshold, the warning latch re-arms so a later crossing alerts
    /// again.
    pub fn set_budget(&self, budget: u64) {
        let mut state = self.state.lock();
        state.aggregate.budget = budget;
        if budget == 0 {
            state.aggregate.warning_emitted = false;
            return;
        }
        let utilization = state.aggregate.total_tokens as f64 / budget as f64;
        if utilization < self.warning_threshold {
            state.aggregate.warning_emitted = false;
        }
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.aggregate = AggregateQuota::default();
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
