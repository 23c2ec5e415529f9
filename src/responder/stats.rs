//! Responder statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-outcome counters shared by every handler invocation
#[derive(Debug, Default)]
pub struct ResponderStats {
    /// A and AAAA questions handled
    pub queries: AtomicU64,
    /// Answers written to the transport
    pub emitted: AtomicU64,
    /// Answers discarded by the drop decision
    pub dropped: AtomicU64,
    /// Answers written in truncated form
    pub truncated: AtomicU64,
    /// Questions of other record types
    pub ignored: AtomicU64,
    /// Requests the codec could not parse
    pub malformed: AtomicU64,
    /// Injected delay across all answers, in milliseconds
    pub jitter_ms_total: AtomicU64,
}

impl ResponderStats {
    /// Create new stats
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_jitter(&self, jitter: Duration) {
        let ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
        self.jitter_ms_total.fetch_add(ms, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current stats
    #[must_use]
    pub fn snapshot(&self) -> ResponderStatsSnapshot {
        ResponderStatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            jitter_ms_total: self.jitter_ms_total.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of responder statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponderStatsSnapshot {
    pub queries: u64,
    pub emitted: u64,
    pub dropped: u64,
    pub truncated: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub jitter_ms_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = ResponderStats::new();
        ResponderStats::incr(&stats.queries);
        ResponderStats::incr(&stats.queries);
        ResponderStats::incr(&stats.dropped);
        stats.record_jitter(Duration::from_millis(1500));
        stats.record_jitter(Duration::from_millis(3));

        let snap = stats.snapshot();
        assert_eq!(snap.queries, 2);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.emitted, 0);
        assert_eq!(snap.jitter_ms_total, 1503);
    }
}
