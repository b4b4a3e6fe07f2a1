//! Initial sync barrier
//!
//! Bounds controller startup: construction waits until the watch reports
//! its initial list as applied, or until `max_wait` elapses, whichever
//! comes first. Hitting the ceiling is a degraded start, not an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Smallest poll interval honored, so a zero interval cannot busy-loop
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Source of the "initial list delivered" signal
pub trait SyncSignal {
    fn has_synced(&self) -> bool;
}

impl<F> SyncSignal for F
where
    F: Fn() -> bool,
{
    fn has_synced(&self) -> bool {
        self()
    }
}

/// Shared flag raised once the initial list has been applied
#[derive(Debug, Clone, Default)]
pub struct SyncFlag(Arc<AtomicBool>);

impl SyncFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_synced(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_synced(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl SyncSignal for SyncFlag {
    fn has_synced(&self) -> bool {
        self.is_synced()
    }
}

/// How the barrier finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { elapsed: Duration },
    TimedOut { waited: Duration },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            SyncOutcome::Synced { elapsed } => *elapsed,
            SyncOutcome::TimedOut { waited } => *waited,
        }
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Synced { .. } => "synced",
            SyncOutcome::TimedOut { .. } => "timed_out",
        }
    }
}

/// Poll `signal` every `poll_interval` until it is set or `max_wait` passes
///
/// Returns immediately if the signal is already set. Never sleeps past the
/// deadline.
pub async fn await_initial_sync<S>(
    signal: &S,
    max_wait: Duration,
    poll_interval: Duration,
) -> SyncOutcome
where
    S: SyncSignal + ?Sized,
{
    let start = Instant::now();
    let deadline = start + max_wait;
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

    loop {
        if signal.has_synced() {
            return SyncOutcome::Synced {
                elapsed: start.elapsed(),
            };
        }

        let now = Instant::now();
        if now >= deadline {
            return SyncOutcome::TimedOut {
                waited: now - start,
            };
        }

        debug!("Waiting for the initial ingress list to be synced");
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}
