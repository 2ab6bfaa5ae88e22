//! The merge oracle — turns a tally decision into an enacted outcome.
//!
//! Acceptance merges the motion's isolated branch into the main line
//! (history-preserving, never fast-forward); rejection discards the
//! branch. Either way the motion's state advances to its terminal rank,
//! and a second call returns the recorded decision without repeating the
//! side effect.

use plenum_parliament::{MotionStore, NoHooks, ParliamentError, ParliamentHooks};
use plenum_store::{RefStore, StoreError};
use plenum_tally::TallyEngine;
use plenum_types::{Clock, Decision, MotionId, MotionState, ParliamentParams, RemoteName};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// The merge/delete action itself failed. Fatal: the motion stays in
    /// `Voting` and nothing retries automatically.
    #[error("enactment failed for motion {motion}: {source}")]
    Enactment {
        motion: MotionId,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Parliament(#[from] ParliamentError),
}

/// Decides and enacts motions.
///
/// `decide_and_enact` for one motion must not race itself from two
/// callers; the oracle guards this by claiming the motion with the
/// single-step `Voting → Decided` transition before acting; the loser of
/// a race gets `InvalidTransition`.
pub struct MergeOracle<S> {
    store: Arc<S>,
    motions: MotionStore<S>,
    engine: TallyEngine<S>,
    hooks: Arc<dyn ParliamentHooks>,
}

impl<S: RefStore> MergeOracle<S> {
    /// `local` names the participant store carrying the motion records and
    /// branches this oracle enacts on.
    pub fn new(store: Arc<S>, local: RemoteName, params: ParliamentParams) -> Self {
        Self {
            motions: MotionStore::new(Arc::clone(&store), local),
            engine: TallyEngine::new(Arc::clone(&store), params),
            store,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.motions = self.motions.with_clock(Arc::clone(&clock));
        self.engine = self.engine.with_clock(clock);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ParliamentHooks>) -> Self {
        self.engine = self.engine.with_hooks(Arc::clone(&hooks));
        self.hooks = hooks;
        self
    }

    pub fn engine(&self) -> &TallyEngine<S> {
        &self.engine
    }

    /// Tally a motion and enact the outcome.
    ///
    /// Already-terminal motions return their recorded decision without any
    /// further action. The motion must otherwise be in `Voting`.
    pub fn decide_and_enact(
        &self,
        motion_id: &MotionId,
        remotes: &[RemoteName],
        accept_threshold: f64,
    ) -> Result<Decision, OracleError> {
        let motion = self.motions.get(motion_id)?;
        match motion.state {
            MotionState::Merged => {
                tracing::debug!(motion = %motion_id, "already merged, returning recorded decision");
                return Ok(Decision::Accepted);
            }
            MotionState::Rejected => {
                tracing::debug!(motion = %motion_id, "already rejected, returning recorded decision");
                return Ok(Decision::Rejected);
            }
            _ => {}
        }

        // Claim the motion. Only Voting -> Decided is legal, so a
        // concurrent claimant (or a motion not yet open for deciding)
        // fails here before any side effect.
        self.motions.advance_state(motion_id, MotionState::Decided)?;

        let result = match self.engine.tally(motion_id, remotes, accept_threshold) {
            Ok(result) => result,
            Err(e) => {
                self.release_claim(motion_id);
                return Err(e.into());
            }
        };

        let branch = motion_id.branch();
        let enactment = match result.decision {
            Decision::Accepted => self.store.merge_branch(&branch, true),
            Decision::Rejected => self.store.delete_branch(&branch),
        };
        if let Err(source) = enactment {
            self.release_claim(motion_id);
            return Err(OracleError::Enactment {
                motion: motion_id.clone(),
                source,
            });
        }

        let terminal = match result.decision {
            Decision::Accepted => MotionState::Merged,
            Decision::Rejected => MotionState::Rejected,
        };
        self.motions.advance_state(motion_id, terminal)?;

        tracing::info!(
            motion = %motion_id,
            decision = %result.decision,
            approval = result.approval_rate,
            "decision enacted"
        );
        self.hooks.decision_enacted(motion_id, result.decision);
        Ok(result.decision)
    }

    fn release_claim(&self, motion_id: &MotionId) {
        if let Err(e) = self.motions.revert_decision(motion_id) {
            tracing::error!(motion = %motion_id, error = %e, "failed to release enactment claim");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_nullables::{MemoryNetwork, NullClock, SeqIds};
    use plenum_parliament::VoteLedger;
    use plenum_types::{ActorId, VoteValue};

    fn remote(name: &str) -> RemoteName {
        RemoteName::new(name).unwrap()
    }

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    struct Fixture {
        net: Arc<MemoryNetwork>,
        oracle: MergeOracle<plenum_nullables::MemoryRefStore>,
        motion_id: MotionId,
    }

    /// A motion in Voting state on the "parliament" store.
    fn fixture() -> Fixture {
        let net = MemoryNetwork::new();
        let handle = Arc::new(net.handle(&remote("parliament")));
        let motions = MotionStore::new(Arc::clone(&handle), remote("parliament"))
            .with_ids(Arc::new(SeqIds::new()))
            .with_clock(Arc::new(NullClock::new(100)));
        let motion_id = motions.create("t", "b", &actor("alice")).unwrap();
        motions.advance_state(&motion_id, MotionState::Open).unwrap();
        motions
            .advance_state(&motion_id, MotionState::Voting)
            .unwrap();

        let oracle = MergeOracle::new(
            handle,
            remote("parliament"),
            ParliamentParams::default(),
        )
        .with_clock(Arc::new(NullClock::new(500)));
        Fixture {
            net,
            oracle,
            motion_id,
        }
    }

    fn cast(net: &Arc<MemoryNetwork>, voter: &str, motion: &MotionId, value: VoteValue) {
        let ledger = VoteLedger::new(Arc::new(net.handle(&remote(voter))))
            .with_clock(Arc::new(NullClock::new(200)));
        ledger.cast(motion, &actor(voter), value, 1.0).unwrap();
    }

    fn voter_remotes() -> Vec<RemoteName> {
        vec![remote("alice"), remote("bob"), remote("carol")]
    }

    #[test]
    fn accepted_motion_is_merged() {
        let f = fixture();
        cast(&f.net, "alice", &f.motion_id, VoteValue::For);
        cast(&f.net, "bob", &f.motion_id, VoteValue::For);
        cast(&f.net, "carol", &f.motion_id, VoteValue::Against);

        let decision = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap();
        assert_eq!(decision, Decision::Accepted);
        assert_eq!(
            f.net.merged_branches(&remote("parliament")),
            vec![f.motion_id.branch()]
        );
        // Branch survives a merge; only rejection deletes it.
        assert!(f.net.has_branch(&remote("parliament"), &f.motion_id.branch()));
    }

    #[test]
    fn rejected_motion_branch_is_discarded() {
        let f = fixture();
        cast(&f.net, "alice", &f.motion_id, VoteValue::Against);
        cast(&f.net, "bob", &f.motion_id, VoteValue::Against);

        let decision = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap();
        assert_eq!(decision, Decision::Rejected);
        assert!(f.net.merged_branches(&remote("parliament")).is_empty());
        assert!(!f.net.has_branch(&remote("parliament"), &f.motion_id.branch()));
    }

    #[test]
    fn second_call_returns_recorded_decision_without_reenacting() {
        let f = fixture();
        cast(&f.net, "alice", &f.motion_id, VoteValue::For);

        let first = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap();
        let second = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap();
        assert_eq!(first, Decision::Accepted);
        assert_eq!(second, Decision::Accepted);
        // Exactly one merge happened.
        assert_eq!(f.net.merged_branches(&remote("parliament")).len(), 1);
    }

    #[test]
    fn enactment_failure_releases_claim_and_propagates() {
        let f = fixture();
        cast(&f.net, "alice", &f.motion_id, VoteValue::For);
        f.net.set_fail_branch_ops(true);

        let err = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap_err();
        assert!(matches!(err, OracleError::Enactment { .. }));

        // Motion is back in Voting and the branch is intact; a retry after
        // the backend recovers succeeds.
        let handle = Arc::new(f.net.handle(&remote("parliament")));
        let motions = MotionStore::new(handle, remote("parliament"));
        assert_eq!(
            motions.get(&f.motion_id).unwrap().state,
            MotionState::Voting
        );
        assert!(f.net.has_branch(&remote("parliament"), &f.motion_id.branch()));

        f.net.set_fail_branch_ops(false);
        let decision = f
            .oracle
            .decide_and_enact(&f.motion_id, &voter_remotes(), 0.6)
            .unwrap();
        assert_eq!(decision, Decision::Accepted);
    }

    #[test]
    fn motion_not_in_voting_cannot_be_enacted() {
        let net = MemoryNetwork::new();
        let handle = Arc::new(net.handle(&remote("parliament")));
        let motions = MotionStore::new(Arc::clone(&handle), remote("parliament"))
            .with_ids(Arc::new(SeqIds::new()));
        let id = motions.create("t", "b", &actor("alice")).unwrap();

        let oracle = MergeOracle::new(handle, remote("parliament"), ParliamentParams::default());
        assert!(matches!(
            oracle.decide_and_enact(&id, &voter_remotes(), 0.6),
            Err(OracleError::Parliament(
                ParliamentError::InvalidTransition { .. }
            ))
        ));
    }

    #[test]
    fn missing_motion_is_fatal() {
        let net = MemoryNetwork::new();
        let handle = Arc::new(net.handle(&remote("parliament")));
        let oracle = MergeOracle::new(handle, remote("parliament"), ParliamentParams::default());
        let missing = MotionId::new("Mmiss01").unwrap();
        assert!(matches!(
            oracle.decide_and_enact(&missing, &voter_remotes(), 0.6),
            Err(OracleError::Parliament(ParliamentError::MotionNotFound(_)))
        ));
    }
}
