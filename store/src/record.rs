//! Wire record codec.
//!
//! Payloads are validated into a tagged union at the store boundary, so a
//! malformed object is rejected (and counted) during ingestion instead of
//! failing deep inside a tally. Shapes are kept compatible with ledgers
//! already in the field:
//!
//! - ballots: `{"vote": "for"|"against"|"abstain", "weight": 1.0,
//!   "timestamp": "2026-08-08T12:00:00Z"}` (weight defaults to 1.0)
//! - delegations: the plain delegate identifier as the whole payload
//! - debate entries and motion records: tagged JSON (plenum additions)

use crate::error::StoreError;
use crate::paths;
use plenum_types::{ActorId, MotionId, MotionState, Timestamp, VoteValue};
use serde::{Deserialize, Serialize};

fn default_weight() -> f64 {
    1.0
}

/// One ballot as persisted under `vote/{motion}/{voter}/{nonce}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallotRecord {
    pub vote: VoteValue,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// RFC 3339, stored as text so the ledger stays human-auditable.
    pub timestamp: String,
}

impl BallotRecord {
    pub fn new(vote: VoteValue, weight: f64, at: Timestamp) -> Self {
        Self {
            vote,
            weight,
            timestamp: at.to_rfc3339(),
        }
    }

    /// The parsed timestamp; `None` if the stored text is not RFC 3339.
    pub fn parsed_timestamp(&self) -> Option<Timestamp> {
        Timestamp::parse_rfc3339(&self.timestamp)
    }
}

/// Debate stance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Pro,
    Con,
}

/// One debate-channel entry as persisted under `debate/{motion}/{nonce}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DebateRecord {
    /// A formal second.
    Second { speaker: ActorId, timestamp: String },
    /// An argument for or against.
    Argument {
        speaker: ActorId,
        stance: Stance,
        argument: String,
        timestamp: String,
    },
}

/// Motion metadata as persisted under `motion/{id}`. The motion's content
/// additionally lives as `motions/{id}.md` on its isolated branch; this
/// record is what `get` and state transitions read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionRecord {
    pub id: MotionId,
    pub title: String,
    pub body: String,
    pub author: ActorId,
    pub created_at: String,
    pub state: MotionState,
}

/// A validated record: the tagged union of everything the ledger stores.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Ballot(BallotRecord),
    Delegation(ActorId),
    Debate(DebateRecord),
    Motion(MotionRecord),
}

impl Record {
    /// Decode and validate a payload according to the path it was stored
    /// under. Every failure mode maps to `StoreError::Malformed`.
    pub fn decode(path: &str, payload: &[u8]) -> Result<Self, StoreError> {
        let malformed = |reason: String| StoreError::Malformed {
            path: path.to_string(),
            reason,
        };
        let root = path.split('/').next().unwrap_or_default();
        match root {
            paths::VOTE_ROOT => {
                let record: BallotRecord = serde_json::from_slice(payload)
                    .map_err(|e| malformed(e.to_string()))?;
                if !record.weight.is_finite() {
                    return Err(malformed("non-finite weight".into()));
                }
                if record.parsed_timestamp().is_none() {
                    return Err(malformed(format!("bad timestamp {:?}", record.timestamp)));
                }
                Ok(Self::Ballot(record))
            }
            paths::DELEGATE_ROOT => {
                let text = std::str::from_utf8(payload)
                    .map_err(|e| malformed(e.to_string()))?
                    .trim();
                let delegate =
                    ActorId::new(text).map_err(|e| malformed(format!("bad delegate: {e}")))?;
                Ok(Self::Delegation(delegate))
            }
            paths::DEBATE_ROOT => {
                let record: DebateRecord = serde_json::from_slice(payload)
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(Self::Debate(record))
            }
            paths::MOTION_ROOT => {
                let record: MotionRecord = serde_json::from_slice(payload)
                    .map_err(|e| malformed(e.to_string()))?;
                Ok(Self::Motion(record))
            }
            other => Err(malformed(format!("unknown record root {other:?}"))),
        }
    }

    /// Encode for persistence. Delegations are plain text; everything else
    /// is JSON.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let json = |v: serde_json::Result<Vec<u8>>| {
            v.map_err(|e| StoreError::Backend(format!("encode: {e}")))
        };
        match self {
            Self::Ballot(b) => json(serde_json::to_vec(b)),
            Self::Delegation(delegate) => Ok(delegate.as_str().as_bytes().to_vec()),
            Self::Debate(d) => json(serde_json::to_vec(d)),
            Self::Motion(m) => json(serde_json::to_vec(m)),
        }
    }
}
