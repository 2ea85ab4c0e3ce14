//! Lock-free per-outcome counters

use crate::outcome::{AllocationOutcome, OutcomeKind};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// One atomic counter per outcome kind, shared by every worker
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    counts: [AtomicU64; OutcomeKind::ALL.len()],
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome
    pub fn record(&self, outcome: &AllocationOutcome) {
        self.increment(outcome.kind());
    }

    pub fn increment(&self, kind: OutcomeKind) {
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: OutcomeKind) -> u64 {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> OutcomeTally {
        OutcomeTally {
            success: self.get(OutcomeKind::Success),
            duplicate: self.get(OutcomeKind::Duplicate),
            out_of_stock: self.get(OutcomeKind::OutOfStock),
            lock_timeout: self.get(OutcomeKind::LockTimeout),
            server_error: self.get(OutcomeKind::ServerError),
            network_error: self.get(OutcomeKind::NetworkError),
            unclassified: self.get(OutcomeKind::Unclassified),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub success: u64,
    pub duplicate: u64,
    pub out_of_stock: u64,
    pub lock_timeout: u64,
    pub server_error: u64,
    pub network_error: u64,
    pub unclassified: u64,
}

impl OutcomeTally {
    pub fn get(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Success => self.success,
            OutcomeKind::Duplicate => self.duplicate,
            OutcomeKind::OutOfStock => self.out_of_stock,
            OutcomeKind::LockTimeout => self.lock_timeout,
            OutcomeKind::ServerError => self.server_error,
            OutcomeKind::NetworkError => self.network_error,
            OutcomeKind::Unclassified => self.unclassified,
        }
    }

    /// Number of observed outcomes; equals the number of requests issued
    pub fn total(&self) -> u64 {
        OutcomeKind::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_are_per_kind() {
        let counters = OutcomeCounters::new();
        counters.record(&AllocationOutcome::Success);
        counters.record(&AllocationOutcome::OutOfStock);
        counters.record(&AllocationOutcome::OutOfStock);
        counters.record(&AllocationOutcome::ServerError { status: 503 });

        let tally = counters.snapshot();
        assert_eq!(tally.success, 1);
        assert_eq!(tally.out_of_stock, 2);
        assert_eq!(tally.server_error, 1);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counters = Arc::new(OutcomeCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        counters.increment(OutcomeKind::NetworkError);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counters.snapshot().network_error, 8_000);
        assert_eq!(counters.snapshot().total(), 8_000);
    }
}
