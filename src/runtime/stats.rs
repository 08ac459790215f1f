//! Instantiation counters.
//!
//! Counters are updated with relaxed atomics and are only meant for diagnostics; a
//! snapshot taken while other threads construct methods is not a consistent cut.

use std::sync::atomic::{AtomicU64, Ordering};

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::method::DispatchKind;

/// Live counters of a [`crate::runtime::GenericMethodCache`]
#[derive(Default)]
pub struct InstantiationStats {
    inflated: AtomicU64,
    fast_hits: AtomicU64,
    recheck_hits: AtomicU64,
    recursion_hits: AtomicU64,
    failures: AtomicU64,
    degenerate: AtomicU64,
    dispatch: [AtomicU64; DispatchKind::COUNT],
}

impl InstantiationStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_fast_hit(&self) {
        self.fast_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recheck_hit(&self) {
        self.recheck_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recursion_hit(&self) {
        self.recursion_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_degenerate(&self) {
        self.degenerate.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inflated(&self, kind: DispatchKind) {
        self.inflated.fetch_add(1, Ordering::Relaxed);
        self.dispatch[kind as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inflated: self.inflated.load(Ordering::Relaxed),
            fast_hits: self.fast_hits.load(Ordering::Relaxed),
            recheck_hits: self.recheck_hits.load(Ordering::Relaxed),
            recursion_hits: self.recursion_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            degenerate: self.degenerate.load(Ordering::Relaxed),
            dispatch: DispatchKind::iter()
                .map(|kind| (kind, self.dispatch[kind as usize].load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

/// Point-in-time copy of [`InstantiationStats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Descriptors constructed and cached
    pub inflated: u64,
    /// Requests answered by the lock-free lookup
    pub fast_hits: u64,
    /// Requests answered by the lookup repeated under the metadata lock
    pub recheck_hits: u64,
    /// Requests answered with a pending descriptor
    pub recursion_hits: u64,
    /// Constructions aborted because the declaring type could not be realized
    pub failures: u64,
    /// Placeholders produced for too deeply nested requests
    pub degenerate: u64,
    /// Constructed descriptors per dispatch shape
    pub dispatch: Vec<(DispatchKind, u64)>,
}

impl StatsSnapshot {
    /// Number of constructed descriptors that resolved to the given dispatch shape
    pub fn dispatch_count(&self, kind: DispatchKind) -> u64 {
        self.dispatch
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, count)| *count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = InstantiationStats::new();
        stats.record_fast_hit();
        stats.record_fast_hit();
        stats.record_inflated(DispatchKind::NativeDirect);
        stats.record_inflated(DispatchKind::InterpretedViaThunk);
        stats.record_degenerate();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.fast_hits, 2);
        assert_eq!(snapshot.inflated, 2);
        assert_eq!(snapshot.degenerate, 1);
        assert_eq!(snapshot.failures, 0);
        assert_eq!(snapshot.dispatch_count(DispatchKind::NativeDirect), 1);
        assert_eq!(snapshot.dispatch_count(DispatchKind::InterpretedViaThunk), 1);
        assert_eq!(snapshot.dispatch_count(DispatchKind::Unresolved), 0);
        assert_eq!(snapshot.dispatch.len(), DispatchKind::COUNT);
    }
}
