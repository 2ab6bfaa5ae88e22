//! Ballot values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three admissible ballot values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    For,
    Against,
    Abstain,
}

impl VoteValue {
    /// Wire spelling, as stored in ballot payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
            Self::Abstain => "abstain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "for" => Some(Self::For),
            "against" => Some(Self::Against),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }

    /// Tie-break precedence when aggregated weights are equal:
    /// For > Abstain > Against.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::For => 2,
            Self::Abstain => 1,
            Self::Against => 0,
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The admissible ballot weight range. Weights outside it are recorded as
/// anomalies (or rejected in strict mode) but the bounds themselves are
/// protocol constants.
pub const MIN_WEIGHT: f64 = 0.0;
pub const MAX_WEIGHT: f64 = 10.0;

/// Whether a weight is finite and inside the admissible range.
pub fn weight_in_range(weight: f64) -> bool {
    weight.is_finite() && (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight)
}
