//! Tally outcome types.
//!
//! A `TallyResult` is pure, derived data: it is recomputed from the ledger
//! on demand and never persisted as ground truth.

use crate::motion::MotionId;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The accept/reject outcome of a tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The deterministic result of tallying one motion against a set of
/// remotes. Two tallies over an unchanged ledger are bit-identical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TallyResult {
    pub motion_id: MotionId,
    /// Σ weight over the fan-in output.
    pub total_weight: f64,
    /// Σ weight over ballots whose resolved value is For.
    pub yes_weight: f64,
    /// resolved ballots / max(casting voters + delegation edges, 1).
    pub participation_rate: f64,
    /// yes_weight / max(total_weight, 1).
    pub approval_rate: f64,
    pub decision: Decision,
    /// Number of final effective voters after delegation resolution.
    pub resolved_ballot_count: usize,
    pub computed_at: Timestamp,
}

impl TallyResult {
    pub fn is_accepted(&self) -> bool {
        self.decision == Decision::Accepted
    }
}
