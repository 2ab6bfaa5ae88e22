//! Scatter-gather across remotes.
//!
//! One enumerate+fetch per remote. Unreachable remotes are skipped and
//! reported, never fatal. Reads may run in parallel only when the caller's
//! fan-in policy is order-insensitive; either way the combined output
//! preserves caller remote order, so the same inputs always produce the
//! same raw ledger.

use plenum_parliament::{Ballot, DelegationEdge, DelegationGraph, ParliamentError, VoteLedger};
use plenum_store::{RefStore, StoreError};
use plenum_types::{MotionId, RemoteName};
use rayon::prelude::*;

/// Everything a tally reads: ballots for one motion plus the global edge
/// set, in deterministic (caller remote order, then path order) sequence.
#[derive(Clone, Debug, Default)]
pub struct RawLedger {
    pub ballots: Vec<Ballot>,
    pub edges: Vec<DelegationEdge>,
    /// Remotes skipped as unreachable, in caller order.
    pub skipped_remotes: Vec<RemoteName>,
}

type RemoteRead = Result<Option<(Vec<Ballot>, Vec<DelegationEdge>)>, ParliamentError>;

fn read_remote<S: RefStore>(
    ledger: &VoteLedger<S>,
    graph: &DelegationGraph<S>,
    motion: &MotionId,
    remote: &RemoteName,
) -> RemoteRead {
    let ballots = match ledger.enumerate(motion, remote) {
        Ok(b) => b,
        Err(ParliamentError::Store(StoreError::Unreachable(_))) => return Ok(None),
        Err(e) => return Err(e),
    };
    let edges = match graph.enumerate(remote) {
        Ok(e) => e,
        Err(ParliamentError::Store(StoreError::Unreachable(_))) => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some((ballots, edges)))
}

/// Gather ballots and edges from every remote.
///
/// `parallel` must only be set when downstream processing is order-
/// insensitive (`FanInPolicy::Aggregate`); results are stitched back in
/// caller order regardless, so parallelism never changes the output.
pub fn collect<S: RefStore>(
    ledger: &VoteLedger<S>,
    graph: &DelegationGraph<S>,
    motion: &MotionId,
    remotes: &[RemoteName],
    parallel: bool,
) -> Result<RawLedger, ParliamentError> {
    let reads: Vec<RemoteRead> = if parallel {
        remotes
            .par_iter()
            .map(|remote| read_remote(ledger, graph, motion, remote))
            .collect()
    } else {
        remotes
            .iter()
            .map(|remote| read_remote(ledger, graph, motion, remote))
            .collect()
    };

    let mut raw = RawLedger::default();
    for (remote, read) in remotes.iter().zip(reads) {
        match read? {
            Some((ballots, edges)) => {
                raw.ballots.extend(ballots);
                raw.edges.extend(edges);
            }
            None => {
                tracing::warn!(remote = %remote, "remote unreachable, skipping in tally");
                raw.skipped_remotes.push(remote.clone());
            }
        }
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_nullables::{MemoryNetwork, NullClock, SeqIds};
    use plenum_types::{ActorId, VoteValue};
    use std::sync::Arc;

    fn remote(name: &str) -> RemoteName {
        RemoteName::new(name).unwrap()
    }

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn motion() -> MotionId {
        MotionId::new("M1a2b3c").unwrap()
    }

    fn seed(net: &Arc<MemoryNetwork>, voter: &str, value: VoteValue) {
        let ledger = VoteLedger::new(Arc::new(net.handle(&remote(voter))))
            .with_ids(Arc::new(SeqIds::new()))
            .with_clock(Arc::new(NullClock::new(100)));
        ledger.cast(&motion(), &actor(voter), value, 1.0).unwrap();
    }

    fn reader(net: &Arc<MemoryNetwork>) -> (
        VoteLedger<plenum_nullables::MemoryRefStore>,
        DelegationGraph<plenum_nullables::MemoryRefStore>,
    ) {
        let handle = Arc::new(net.handle(&remote("oracle")));
        (
            VoteLedger::new(Arc::clone(&handle)),
            DelegationGraph::new(handle),
        )
    }

    #[test]
    fn gathers_in_caller_remote_order() {
        let net = MemoryNetwork::new();
        seed(&net, "alice", VoteValue::For);
        seed(&net, "bob", VoteValue::Against);
        let (ledger, graph) = reader(&net);

        let remotes = [remote("bob"), remote("alice")];
        let raw = collect(&ledger, &graph, &motion(), &remotes, false).unwrap();
        let voters: Vec<_> = raw.ballots.iter().map(|b| b.voter.as_str()).collect();
        assert_eq!(voters, vec!["bob", "alice"]);
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let net = MemoryNetwork::new();
        for (name, value) in [
            ("alice", VoteValue::For),
            ("bob", VoteValue::Against),
            ("carol", VoteValue::Abstain),
        ] {
            seed(&net, name, value);
        }
        let (ledger, graph) = reader(&net);
        let remotes = [remote("alice"), remote("bob"), remote("carol")];

        let seq = collect(&ledger, &graph, &motion(), &remotes, false).unwrap();
        let par = collect(&ledger, &graph, &motion(), &remotes, true).unwrap();
        assert_eq!(seq.ballots, par.ballots);
        assert_eq!(seq.edges, par.edges);
    }

    #[test]
    fn unreachable_remote_skipped_and_reported() {
        let net = MemoryNetwork::new();
        seed(&net, "alice", VoteValue::For);
        net.set_down(&remote("bob"), true);
        let (ledger, graph) = reader(&net);

        let remotes = [remote("alice"), remote("bob")];
        let raw = collect(&ledger, &graph, &motion(), &remotes, false).unwrap();
        assert_eq!(raw.ballots.len(), 1);
        assert_eq!(raw.skipped_remotes, vec![remote("bob")]);
    }
}
