// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource sampling via `/proc`. Linux-only; on other platforms sampling
//! always returns `None` and alerts based on it simply never fire.

/// A point-in-time resource reading for one process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub memory_mb: f64,
    pub cpu_pct: f64,
}

#[cfg(target_os = "linux")]
pub fn sample(pid: i32) -> Option<ResourceSample> {
    let memory_mb = read_rss_mb(pid)?;
    let cpu_pct = read_cpu_pct(pid).unwrap_or(0.0);
    Some(ResourceSample { memory_mb, cpu_pct })
}

#[cfg(not(target_os = "linux"))]
pub fn sample(_pid: i32) -> Option<ResourceSample> {
    None
}

#[cfg(target_os = "linux")]
fn read_rss_mb(pid: i32) -> Option<f64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())?;
    Some(kb as f64 / 1024.0)
}

/// Instantaneous CPU percentage is undefined for a single `/proc/<pid>/stat`
/// read, so this only reports process CPU time accumulated since start
/// divided by wall time since start — callers sampling periodically get a
/// reasonable trend, not an exact instantaneous load.
#[cfg(target_os = "linux")]
fn read_cpu_pct(pid: i32) -> Option<f64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // Fields after the (possibly space-containing) comm field in parens.
    let after_comm = stat.rsplit_once(')')?.1;
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // utime is field 14, stime is field 15 counting from field 1 = pid;
    // after stripping pid and comm, utime/stime are indices 11/12.
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    let starttime: u64 = fields.get(19)?.parse().ok()?;

    let clk_tck = sysconf_clk_tck();
    let uptime = read_uptime_secs()?;
    let process_start_secs = starttime as f64 / clk_tck;
    let process_age_secs = (uptime - process_start_secs).max(0.001);
    let total_cpu_secs = (utime + stime) as f64 / clk_tck;
    Some((total_cpu_secs / process_age_secs) * 100.0)
}

#[cfg(target_os = "linux")]
fn read_uptime_secs() -> Option<f64> {
    let uptime = std::fs::read_to_string("/proc/uptime").ok()?;
    uptime.split_whitespace().next()?.parse().ok()
}

#[cfg(target_os = "linux")]
fn sysconf_clk_tck() -> f64 {
    100.0
}

#[cfg(test)]
#[path = "proc_sample_tests.rs"]
mod tests;
