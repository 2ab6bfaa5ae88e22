//! Weighted tally computation.

use crate::collect::collect;
use crate::resolve::{build_delegation_map, resolve_chain};
use plenum_parliament::{Ballot, DelegationGraph, NoHooks, ParliamentError, ParliamentHooks, VoteLedger};
use plenum_store::RefStore;
use plenum_types::{
    ActorId, Clock, Decision, DedupPolicy, FanInPolicy, MotionId, ParliamentParams, RemoteName,
    ResolutionPolicy, SystemClock, TallyResult, VoteValue,
};
use plenum_utils::stats::{self, StatsCounter};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Per-tally observability summary: everything that was skipped, truncated,
/// or discarded on the way to the result. Non-fatal conditions land here
/// (and in the shared anomaly counters) instead of being swallowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TallyDiagnostics {
    /// Ballot records gathered before per-voter dedup.
    pub raw_ballot_count: usize,
    /// Distinct casting voters after dedup.
    pub casting_voters: usize,
    /// Distinct delegators in the merged delegation map.
    pub delegation_edges: usize,
    /// Remotes skipped as unreachable, in caller order.
    pub skipped_remotes: Vec<RemoteName>,
    /// Delegation chains cut short by a cycle.
    pub cycles: usize,
    /// Delegation chains cut short by the depth limit.
    pub depth_truncations: usize,
    /// Longest chain walked.
    pub max_chain_depth: usize,
    /// Weight on losing values discarded by aggregate fan-in.
    pub discarded_weight: f64,
}

/// Computes [`TallyResult`]s from the distributed ledger.
///
/// The engine is read-only: it owns reader handles over one store view and
/// never writes. Determinism: given an unchanged ledger, a fixed remote
/// list, and a fixed clock, `tally` returns bit-identical results; under
/// `FanInPolicy::Overwrite` this additionally relies on the sequential
/// deterministic fetch order the engine enforces for that policy.
pub struct TallyEngine<S> {
    ledger: VoteLedger<S>,
    graph: DelegationGraph<S>,
    params: ParliamentParams,
    clock: Arc<dyn Clock>,
    hooks: Arc<dyn ParliamentHooks>,
    stats: Arc<StatsCounter>,
}

impl<S: RefStore> TallyEngine<S> {
    pub fn new(store: Arc<S>, params: ParliamentParams) -> Self {
        let stats = Arc::new(stats::anomaly_counters());
        Self {
            ledger: VoteLedger::new(Arc::clone(&store)).with_stats(Arc::clone(&stats)),
            graph: DelegationGraph::new(store).with_stats(Arc::clone(&stats)),
            params,
            clock: Arc::new(SystemClock),
            hooks: Arc::new(NoHooks),
            stats,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ParliamentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn params(&self) -> &ParliamentParams {
        &self.params
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Tally one motion across the given remotes.
    pub fn tally(
        &self,
        motion: &MotionId,
        remotes: &[RemoteName],
        accept_threshold: f64,
    ) -> Result<TallyResult, ParliamentError> {
        self.tally_detailed(motion, remotes, accept_threshold)
            .map(|(result, _)| result)
    }

    /// Tally with the full diagnostics summary.
    pub fn tally_detailed(
        &self,
        motion: &MotionId,
        remotes: &[RemoteName],
        accept_threshold: f64,
    ) -> Result<(TallyResult, TallyDiagnostics), ParliamentError> {
        // Parallel reads are only sound when fan-in is order-insensitive.
        let parallel = self.params.fan_in == FanInPolicy::Aggregate;
        let raw = collect(&self.ledger, &self.graph, motion, remotes, parallel)?;
        let map = build_delegation_map(&raw.edges);

        let mut diags = TallyDiagnostics {
            raw_ballot_count: raw.ballots.len(),
            delegation_edges: map.len(),
            skipped_remotes: raw.skipped_remotes.clone(),
            ..TallyDiagnostics::default()
        };
        self.stats
            .add(stats::UNREACHABLE_REMOTE, raw.skipped_remotes.len() as u64);

        let casters = dedup_per_voter(&raw.ballots, self.params.dedup);
        diags.casting_voters = casters.len();

        let resolved = self.resolve_all(&casters, &map, &mut diags);
        let fanned_in = self.fan_in(resolved, &mut diags);

        let resolved_ballot_count = fanned_in.len();
        let mut total_weight = 0.0;
        let mut yes_weight = 0.0;
        for (_, (value, weight)) in &fanned_in {
            total_weight += weight;
            if *value == VoteValue::For {
                yes_weight += weight;
            }
        }

        let approval_rate = yes_weight / total_weight.max(1.0);
        let participation_rate = resolved_ballot_count as f64
            / (diags.casting_voters + diags.delegation_edges).max(1) as f64;
        let decision = if approval_rate >= accept_threshold {
            Decision::Accepted
        } else {
            Decision::Rejected
        };

        let result = TallyResult {
            motion_id: motion.clone(),
            total_weight,
            yes_weight,
            participation_rate,
            approval_rate,
            decision,
            resolved_ballot_count,
            computed_at: self.clock.now(),
        };

        tracing::info!(
            motion = %motion,
            %decision,
            approval = approval_rate,
            participation = participation_rate,
            resolved = resolved_ballot_count,
            skipped_remotes = diags.skipped_remotes.len(),
            "tally computed"
        );
        self.hooks.tally_computed(&result);
        Ok((result, diags))
    }

    fn resolve_all(
        &self,
        casters: &[Ballot],
        map: &HashMap<ActorId, ActorId>,
        diags: &mut TallyDiagnostics,
    ) -> Vec<(ActorId, Ballot)> {
        casters
            .iter()
            .map(|ballot| {
                let effective = match self.params.resolution {
                    ResolutionPolicy::ForwardOwnBallot => {
                        let r = resolve_chain(&ballot.voter, map, self.params.max_delegation_depth);
                        if r.cycle {
                            diags.cycles += 1;
                            self.stats.increment(stats::DELEGATION_CYCLE);
                            tracing::warn!(
                                voter = %ballot.voter,
                                stopped_at = %r.effective,
                                "delegation cycle, chain truncated"
                            );
                        }
                        if r.truncated {
                            diags.depth_truncations += 1;
                            self.stats.increment(stats::DELEGATION_DEPTH_EXCEEDED);
                            tracing::warn!(
                                voter = %ballot.voter,
                                depth = r.depth,
                                "delegation chain exceeded max depth"
                            );
                        }
                        diags.max_chain_depth = diags.max_chain_depth.max(r.depth);
                        r.effective
                    }
                    ResolutionPolicy::DirectBallotWins => ballot.voter.clone(),
                };
                (effective, ballot.clone())
            })
            .collect()
    }

    fn fan_in(
        &self,
        resolved: Vec<(ActorId, Ballot)>,
        diags: &mut TallyDiagnostics,
    ) -> Vec<(ActorId, (VoteValue, f64))> {
        match self.params.fan_in {
            FanInPolicy::Aggregate => {
                // BTreeMap keeps the output (and thus float summation
                // order) independent of arrival order.
                let mut buckets: BTreeMap<ActorId, BTreeMap<&'static str, (VoteValue, f64)>> =
                    BTreeMap::new();
                for (effective, ballot) in resolved {
                    let bucket = buckets.entry(effective).or_default();
                    let slot = bucket
                        .entry(ballot.value.as_str())
                        .or_insert((ballot.value, 0.0));
                    slot.1 += ballot.weight;
                }
                buckets
                    .into_iter()
                    .map(|(voter, bucket)| {
                        let mut winner: Option<(VoteValue, f64)> = None;
                        let mut losing = 0.0;
                        for (_, (value, weight)) in bucket {
                            match winner {
                                Some((best_value, best_weight))
                                    if weight > best_weight
                                        || (weight == best_weight
                                            && value.precedence() > best_value.precedence()) =>
                                {
                                    losing += best_weight;
                                    winner = Some((value, weight));
                                }
                                Some(_) => losing += weight,
                                None => winner = Some((value, weight)),
                            }
                        }
                        diags.discarded_weight += losing;
                        // A bucket always has at least one entry.
                        let (value, weight) = winner.unwrap_or((VoteValue::Abstain, 0.0));
                        (voter, (value, weight))
                    })
                    .collect()
            }
            FanInPolicy::Overwrite => {
                // Legacy behavior: last-processed ballot per final voter
                // wins; output keeps first-insertion order like the
                // legacy accumulator map.
                let mut order: Vec<ActorId> = Vec::new();
                let mut last: HashMap<ActorId, (VoteValue, f64)> = HashMap::new();
                for (effective, ballot) in resolved {
                    if !last.contains_key(&effective) {
                        order.push(effective.clone());
                    }
                    last.insert(effective, (ballot.value, ballot.weight));
                }
                order
                    .into_iter()
                    .filter_map(|voter| {
                        let entry = last.remove(&voter)?;
                        Some((voter, entry))
                    })
                    .collect()
            }
        }
    }
}

/// Reduce repeated casts to one ballot per voter, preserving first-
/// appearance order so `Overwrite` fan-in sees the legacy iteration
/// order.
fn dedup_per_voter(ballots: &[Ballot], policy: DedupPolicy) -> Vec<Ballot> {
    let mut order: Vec<ActorId> = Vec::new();
    let mut kept: HashMap<ActorId, Ballot> = HashMap::new();
    for ballot in ballots {
        match kept.entry(ballot.voter.clone()) {
            Entry::Vacant(slot) => {
                order.push(ballot.voter.clone());
                slot.insert(ballot.clone());
            }
            Entry::Occupied(mut slot) => {
                let replace = match policy {
                    DedupPolicy::FetchOrder => true,
                    DedupPolicy::LatestTimestamp => {
                        let held = slot.get();
                        (ballot.timestamp, &ballot.nonce) > (held.timestamp, &held.nonce)
                    }
                };
                if replace {
                    slot.insert(ballot.clone());
                }
            }
        }
    }
    order.into_iter().filter_map(|v| kept.remove(&v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_types::Timestamp;

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn ballot(voter: &str, value: VoteValue, weight: f64, at: u64, nonce: &str) -> Ballot {
        Ballot {
            motion_id: MotionId::new("M1a2b3c").unwrap(),
            voter: actor(voter),
            value,
            weight,
            timestamp: Timestamp::new(at),
            nonce: nonce.to_string(),
        }
    }

    #[test]
    fn dedup_latest_timestamp_keeps_newest() {
        let ballots = vec![
            ballot("alice", VoteValue::For, 1.0, 200, "n2"),
            ballot("alice", VoteValue::Against, 1.0, 100, "n1"),
        ];
        let kept = dedup_per_voter(&ballots, DedupPolicy::LatestTimestamp);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value, VoteValue::For);
    }

    #[test]
    fn dedup_latest_timestamp_breaks_ties_by_nonce() {
        let ballots = vec![
            ballot("alice", VoteValue::For, 1.0, 100, "n2"),
            ballot("alice", VoteValue::Against, 1.0, 100, "n1"),
        ];
        let kept = dedup_per_voter(&ballots, DedupPolicy::LatestTimestamp);
        assert_eq!(kept[0].value, VoteValue::For);
    }

    #[test]
    fn dedup_fetch_order_keeps_last_read() {
        let ballots = vec![
            ballot("alice", VoteValue::For, 1.0, 200, "n2"),
            ballot("alice", VoteValue::Against, 1.0, 100, "n1"),
        ];
        let kept = dedup_per_voter(&ballots, DedupPolicy::FetchOrder);
        assert_eq!(kept[0].value, VoteValue::Against);
    }

    #[test]
    fn dedup_preserves_first_appearance_order() {
        let ballots = vec![
            ballot("zed", VoteValue::For, 1.0, 100, "n1"),
            ballot("ann", VoteValue::For, 1.0, 100, "n1"),
            ballot("zed", VoteValue::For, 1.0, 300, "n2"),
        ];
        let kept = dedup_per_voter(&ballots, DedupPolicy::LatestTimestamp);
        let voters: Vec<_> = kept.iter().map(|b| b.voter.as_str()).collect();
        assert_eq!(voters, vec!["zed", "ann"]);
    }
}
