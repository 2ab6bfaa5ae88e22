//! Timestamp type used throughout the protocol.
//!
//! Timestamps are Unix epoch seconds (UTC). On the wire (ballot payloads,
//! debate records) they are rendered as RFC 3339 strings for auditability;
//! internally they stay integral so comparisons are exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// RFC 3339 rendering for wire payloads, e.g. `2026-08-08T12:00:00Z`.
    pub fn to_rfc3339(&self) -> String {
        match chrono::DateTime::<chrono::Utc>::from_timestamp(self.0 as i64, 0) {
            Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            None => "1970-01-01T00:00:00Z".to_string(),
        }
    }

    /// Parse an RFC 3339 wire timestamp. Sub-second precision is truncated.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        let dt = chrono::DateTime::parse_from_rfc3339(s).ok()?;
        let secs = dt.timestamp();
        if secs < 0 {
            return None;
        }
        Some(Self(secs as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
