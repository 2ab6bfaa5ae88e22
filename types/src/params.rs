//! Protocol parameters and named behavior policies.
//!
//! Two quirks of the legacy tally behavior are deliberately preserved
//! behind named policies instead of being silently corrected:
//! [`ResolutionPolicy::ForwardOwnBallot`] and [`FanInPolicy::Overwrite`].
//! The defaults below are the documented recommended configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// How ballot validation failures are handled at cast time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Record the ballot anyway, log the anomaly, and count it.
    /// The default: the ledger stays a complete audit record.
    #[default]
    Permissive,
    /// Reject out-of-range ballots with a validation error.
    Strict,
}

/// How a caster's own delegation entry affects their ballot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Follow the caster's own entry in the delegation map, redirecting a
    /// ballot cast by a voter who also declared a delegation to their
    /// delegate. This reproduces the legacy behavior; most liquid-
    /// democracy designs do not do this, which is why it is a named policy
    /// rather than an implicit one.
    #[default]
    ForwardOwnBallot,
    /// A voter who cast a ballot directly keeps it; delegation only applies
    /// to voters who did not cast.
    DirectBallotWins,
}

/// How multiple resolved ballots landing on one final voter combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanInPolicy {
    /// Sum weights per value; the heaviest value wins (ties broken
    /// For > Abstain > Against) and carries its summed weight. Order
    /// independent, so remote reads may run in parallel. The default.
    #[default]
    Aggregate,
    /// Last-processed ballot wins. Reproduces the legacy behavior and is
    /// order sensitive: fetch order is forced sequential and deterministic
    /// (remotes in caller order, refs in path order).
    Overwrite,
}

/// How repeated ballots by one voter (same or different remotes) reduce to
/// a single ballot before delegation resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Keep the ballot with the latest timestamp; ties fall to the larger
    /// nonce so the outcome is total-ordered. The default.
    #[default]
    LatestTimestamp,
    /// Keep the last ballot read, in fetch order. Reproduces the legacy
    /// behavior; only deterministic under sequential fetch.
    FetchOrder,
}

/// All tunable protocol parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParliamentParams {
    /// Maximum delegation chain hops before resolution truncates.
    pub max_delegation_depth: usize,

    /// Default approval threshold for `decide_and_enact` callers that do
    /// not pass one explicitly. Inclusive boundary.
    pub accept_threshold: f64,

    /// Per-remote read timeout in seconds. Timeout ⇒ remote treated as
    /// unreachable and skipped.
    pub fetch_timeout_secs: u64,

    /// Ballot validation mode.
    pub validation: ValidationMode,

    /// Delegation resolution policy.
    pub resolution: ResolutionPolicy,

    /// Fan-in combination policy.
    pub fan_in: FanInPolicy,

    /// Per-voter ballot dedup policy.
    pub dedup: DedupPolicy,
}

impl Default for ParliamentParams {
    fn default() -> Self {
        Self {
            max_delegation_depth: 10,
            accept_threshold: 0.6,
            fetch_timeout_secs: 5,
            validation: ValidationMode::Permissive,
            resolution: ResolutionPolicy::ForwardOwnBallot,
            fan_in: FanInPolicy::Aggregate,
            dedup: DedupPolicy::LatestTimestamp,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse parameter file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter: {0}")]
    Invalid(String),
}

impl ParliamentParams {
    /// Load parameters from a TOML file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), ParamsError> {
        if self.max_delegation_depth == 0 {
            return Err(ParamsError::Invalid(
                "max_delegation_depth must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(ParamsError::Invalid(format!(
                "accept_threshold {} outside [0, 1]",
                self.accept_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_configuration() {
        let p = ParliamentParams::default();
        assert_eq!(p.max_delegation_depth, 10);
        assert_eq!(p.fan_in, FanInPolicy::Aggregate);
        assert_eq!(p.resolution, ResolutionPolicy::ForwardOwnBallot);
        assert_eq!(p.dedup, DedupPolicy::LatestTimestamp);
        assert_eq!(p.validation, ValidationMode::Permissive);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let p = ParliamentParams::from_toml(
            r#"
            accept_threshold = 0.75
            fan_in = "overwrite"
            "#,
        )
        .unwrap();
        assert_eq!(p.accept_threshold, 0.75);
        assert_eq!(p.fan_in, FanInPolicy::Overwrite);
        assert_eq!(p.max_delegation_depth, 10);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(ParliamentParams::from_toml("accept_threshold = 1.5").is_err());
        assert!(ParliamentParams::from_toml("max_delegation_depth = 0").is_err());
    }
}
