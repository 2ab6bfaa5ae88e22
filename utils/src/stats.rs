//! Anomaly and audit counters.
//!
//! Non-fatal conditions (out-of-range weights, skipped remotes, truncated
//! delegation chains, malformed records) are never swallowed silently;
//! components increment a shared `StatsCounter` so long-run anomaly rates
//! stay auditable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter name: ballot weight outside the admissible range.
pub const SUSPICIOUS_WEIGHT: &str = "suspicious_weight";
/// Counter name: record skipped because its payload failed to parse.
pub const MALFORMED_RECORD: &str = "malformed_record";
/// Counter name: remote skipped as unreachable during a tally.
pub const UNREACHABLE_REMOTE: &str = "unreachable_remote";
/// Counter name: delegation chain truncated by a cycle.
pub const DELEGATION_CYCLE: &str = "delegation_cycle";
/// Counter name: delegation chain truncated at max depth.
pub const DELEGATION_DEPTH_EXCEEDED: &str = "delegation_depth_exceeded";

/// The full set of protocol anomaly counters.
pub fn anomaly_counters() -> StatsCounter {
    StatsCounter::new(&[
        SUSPICIOUS_WEIGHT,
        MALFORMED_RECORD,
        UNREACHABLE_REMOTE,
        DELEGATION_CYCLE,
        DELEGATION_DEPTH_EXCEEDED,
    ])
}

/// A thread-safe counter collection.
///
/// Counters are registered at construction; incrementing an unregistered
/// name is a no-op rather than a panic, so instrumentation can never take
/// the protocol down.
pub struct StatsCounter {
    counters: HashMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        let mut counters = HashMap::new();
        for &name in names {
            counters.insert(name, AtomicU64::new(0));
        }
        Self { counters }
    }

    pub fn increment(&self, name: &str) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_registered_counters() {
        let stats = anomaly_counters();
        stats.increment(SUSPICIOUS_WEIGHT);
        stats.increment(SUSPICIOUS_WEIGHT);
        stats.add(UNREACHABLE_REMOTE, 3);
        assert_eq!(stats.get(SUSPICIOUS_WEIGHT), 2);
        assert_eq!(stats.get(UNREACHABLE_REMOTE), 3);
        assert_eq!(stats.get(DELEGATION_CYCLE), 0);
    }

    #[test]
    fn unregistered_names_are_noops() {
        let stats = StatsCounter::new(&["a"]);
        stats.increment("missing");
        assert_eq!(stats.get("missing"), 0);
    }
}
