//! The vote ledger — append-only ballots, one store per voter.
//!
//! Every cast lands on a fresh `vote/{motion}/{voter}/{nonce}` path, so
//! repeated casts accumulate instead of colliding and no two voters ever
//! contend for a write target. The local write is durable before `cast`
//! returns; propagation to any shared aggregation point is the backend's
//! best-effort concern.

use crate::error::ParliamentError;
use crate::hooks::{NoHooks, ParliamentHooks};
use crate::ids::RandomIds;
use plenum_store::record::BallotRecord;
use plenum_store::{paths, Record, RefStore};
use plenum_types::{
    vote, ActorId, Clock, IdSource, MotionId, RemoteName, SystemClock, Timestamp, ValidationMode,
    VoteValue,
};
use plenum_utils::stats::{self, StatsCounter};
use std::sync::Arc;

/// One recorded ballot, as read back from a remote.
#[derive(Clone, Debug, PartialEq)]
pub struct Ballot {
    pub motion_id: MotionId,
    pub voter: ActorId,
    pub value: VoteValue,
    pub weight: f64,
    pub timestamp: Timestamp,
    /// The record's unique path suffix; used as a deterministic tie-break.
    pub nonce: String,
}

/// Writes ballots to the owning voter's store and reads them back from
/// any remote.
pub struct VoteLedger<S> {
    store: Arc<S>,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
    hooks: Arc<dyn ParliamentHooks>,
    mode: ValidationMode,
    stats: Arc<StatsCounter>,
}

impl<S: RefStore> VoteLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ids: Arc::new(RandomIds),
            clock: Arc::new(SystemClock),
            hooks: Arc::new(NoHooks),
            mode: ValidationMode::Permissive,
            stats: Arc::new(stats::anomaly_counters()),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ParliamentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsCounter>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Record a ballot.
    ///
    /// A weight outside `[0, 10]` is a security anomaly. In `Permissive`
    /// mode (the default) the ballot is still recorded, logged, and
    /// counted; the ledger is an audit record, and suppressing the write
    /// would hide the anomaly. `Strict` mode rejects it. A non-finite
    /// weight is rejected in both modes: it has no JSON wire
    /// representation.
    pub fn cast(
        &self,
        motion: &MotionId,
        voter: &ActorId,
        value: VoteValue,
        weight: f64,
    ) -> Result<(), ParliamentError> {
        if !weight.is_finite() {
            return Err(ParliamentError::Validation(format!(
                "ballot weight {weight} is not a finite number"
            )));
        }
        if !vote::weight_in_range(weight) {
            match self.mode {
                ValidationMode::Strict => {
                    return Err(ParliamentError::Validation(format!(
                        "ballot weight {weight} outside [{}, {}]",
                        vote::MIN_WEIGHT,
                        vote::MAX_WEIGHT
                    )));
                }
                ValidationMode::Permissive => {
                    self.stats.increment(stats::SUSPICIOUS_WEIGHT);
                    tracing::warn!(
                        motion = %motion, voter = %voter, weight,
                        "suspicious ballot weight recorded"
                    );
                }
            }
        }

        let record = BallotRecord::new(value, weight, self.clock.now());
        let path = paths::vote_path(motion, voter, &self.ids.nonce());
        let payload = Record::Ballot(record).encode()?;
        self.store.put(&path, &payload)?;

        tracing::info!(motion = %motion, voter = %voter, %value, weight, "ballot cast");
        self.hooks.ballot_cast(motion, voter, value, weight);
        Ok(())
    }

    /// List all ballots for a motion on one remote, in path order.
    ///
    /// An empty namespace is an empty list, not an error. Malformed records
    /// are skipped, logged, and counted; `StoreError::Unreachable`
    /// propagates so the tally can skip the whole remote.
    pub fn enumerate(
        &self,
        motion: &MotionId,
        remote: &RemoteName,
    ) -> Result<Vec<Ballot>, ParliamentError> {
        let listed = self.store.list_prefix(remote, &paths::vote_prefix(motion))?;
        let mut ballots = Vec::with_capacity(listed.len());
        for (content, path) in listed {
            let Some((motion_id, voter, nonce)) = paths::parse_vote_path(&path) else {
                self.stats.increment(stats::MALFORMED_RECORD);
                tracing::warn!(%path, "skipping ref with unparseable ballot path");
                continue;
            };
            let payload = match self.store.get(&content) {
                Ok(p) => p,
                Err(e) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, error = %e, "skipping unreadable ballot");
                    continue;
                }
            };
            match Record::decode(&path, &payload) {
                Ok(Record::Ballot(record)) => {
                    let Some(timestamp) = record.parsed_timestamp() else {
                        self.stats.increment(stats::MALFORMED_RECORD);
                        continue;
                    };
                    ballots.push(Ballot {
                        motion_id,
                        voter,
                        value: record.vote,
                        weight: record.weight,
                        timestamp,
                        nonce,
                    });
                }
                Ok(_) | Err(_) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, "skipping malformed ballot record");
                }
            }
        }
        Ok(ballots)
    }
}
