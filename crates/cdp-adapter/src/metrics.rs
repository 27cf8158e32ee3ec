use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::trace;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterMetricsSnapshot {
    pub commands: u64,
    pub command_success: u64,
    pub command_failures: u64,
    pub command_latency_total_us: u64,
    pub tabs_opened: u64,
    pub tabs_closed: u64,
}

static COMMANDS: AtomicU64 = AtomicU64::new(0);
static COMMAND_SUCCESS: AtomicU64 = AtomicU64::new(0);
static COMMAND_FAILURES: AtomicU64 = AtomicU64::new(0);
static COMMAND_LATENCY_TOTAL_US: AtomicU64 = AtomicU64::new(0);
static TABS_OPENED: AtomicU64 = AtomicU64::new(0);
static TABS_CLOSED: AtomicU64 = AtomicU64::new(0);

pub fn record_command(method: &str) {
    COMMANDS.fetch_add(1, Ordering::Relaxed);
    trace!(target: "cdp-adapter", method, "command dispatched");
}

pub fn record_command_success(method: &str, duration: Duration) {
    COMMAND_SUCCESS.fetch_add(1, Ordering::Relaxed);
    let micros = duration.as_micros().min(u64::MAX as u128) as u64;
    COMMAND_LATENCY_TOTAL_US.fetch_add(micros, Ordering::Relaxed);
    trace!(target: "cdp-adapter", method, micros, "command succeeded");
}

pub fn record_command_failure(method: &str) {
    COMMAND_FAILURES.fetch_add(1, Ordering::Relaxed);
    trace!(target: "cdp-adapter", method, "command failed");
}

pub fn record_tab_opened() {
    TABS_OPENED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_tab_closed() {
    TABS_CLOSED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> AdapterMetricsSnapshot {
    AdapterMetricsSnapshot {
        commands: COMMANDS.load(Ordering::Relaxed),
        command_success: COMMAND_SUCCESS.load(Ordering::Relaxed),
        command_failures: COMMAND_FAILURES.load(Ordering::Relaxed),
        command_latency_total_us: COMMAND_LATENCY_TOTAL_US.load(Ordering::Relaxed),
        tabs_opened: TABS_OPENED.load(Ordering::Relaxed),
        tabs_closed: TABS_CLOSED.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
pub(crate) fn reset() {
    COMMANDS.store(0, Ordering::Relaxed);
    COMMAND_SUCCESS.store(0, Ordering::Relaxed);
    COMMAND_FAILURES.store(0, Ordering::Relaxed);
    COMMAND_LATENCY_TOTAL_US.store(0, Ordering::Relaxed);
    TABS_OPENED.store(0, Ordering::Relaxed);
    TABS_CLOSED.store(0, Ordering::Relaxed);
}
