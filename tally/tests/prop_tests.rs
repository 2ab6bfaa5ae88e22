use proptest::prelude::*;

use plenum_nullables::{MemoryNetwork, NullClock};
use plenum_parliament::{DelegationGraph, VoteLedger};
use plenum_tally::TallyEngine;
use plenum_types::{
    ActorId, Decision, MotionId, ParliamentParams, RemoteName, VoteValue,
};
use std::sync::Arc;

const VOTERS: [&str; 5] = ["v0", "v1", "v2", "v3", "v4"];

fn remote(name: &str) -> RemoteName {
    RemoteName::new(name).unwrap()
}

fn actor(name: &str) -> ActorId {
    ActorId::new(name).unwrap()
}

fn motion() -> MotionId {
    MotionId::new("Mprop01").unwrap()
}

fn value_of(idx: u8) -> VoteValue {
    match idx % 3 {
        0 => VoteValue::For,
        1 => VoteValue::Against,
        _ => VoteValue::Abstain,
    }
}

/// Seed a network from generated ballots and edges.
fn seed(
    ballots: &[(usize, u8, f64, u64)],
    edges: &[(usize, usize)],
) -> Arc<MemoryNetwork> {
    let net = MemoryNetwork::new();
    for &(voter, value, weight, at) in ballots {
        let name = VOTERS[voter % VOTERS.len()];
        let ledger = VoteLedger::new(Arc::new(net.handle(&remote(name))))
            .with_clock(Arc::new(NullClock::new(at)));
        ledger
            .cast(&motion(), &actor(name), value_of(value), weight)
            .unwrap();
    }
    for &(from, to) in edges {
        let from = VOTERS[from % VOTERS.len()];
        let to = VOTERS[to % VOTERS.len()];
        if from == to {
            continue;
        }
        let graph = DelegationGraph::new(Arc::new(net.handle(&remote(from))));
        graph.delegate(&actor(from), &actor(to)).unwrap();
    }
    net
}

fn engine(net: &Arc<MemoryNetwork>) -> TallyEngine<plenum_nullables::MemoryRefStore> {
    TallyEngine::new(
        Arc::new(net.handle(&remote("oracle"))),
        ParliamentParams::default(),
    )
    .with_clock(Arc::new(NullClock::new(10_000)))
}

fn all_remotes() -> Vec<RemoteName> {
    VOTERS.iter().map(|v| remote(v)).collect()
}

proptest! {
    /// Two tallies over an unchanged ledger are bit-identical.
    #[test]
    fn tally_is_pure(
        ballots in prop::collection::vec(
            (0usize..5, 0u8..3, 0.0f64..10.0, 0u64..1_000), 0..12),
        edges in prop::collection::vec((0usize..5, 0usize..5), 0..6),
        threshold in 0.0f64..=1.0,
    ) {
        let net = seed(&ballots, &edges);
        let engine = engine(&net);
        let list = all_remotes();
        let first = engine.tally(&motion(), &list, threshold).unwrap();
        let second = engine.tally(&motion(), &list, threshold).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Under the default aggregate fan-in, the result does not depend on
    /// the order remotes are listed in.
    #[test]
    fn aggregate_is_remote_order_invariant(
        ballots in prop::collection::vec(
            (0usize..5, 0u8..3, 0.0f64..10.0, 0u64..1_000), 0..12),
        edges in prop::collection::vec((0usize..5, 0usize..5), 0..6),
    ) {
        let net = seed(&ballots, &edges);
        let engine = engine(&net);
        let forward = all_remotes();
        let mut reversed = all_remotes();
        reversed.reverse();
        let a = engine.tally(&motion(), &forward, 0.6).unwrap();
        let b = engine.tally(&motion(), &reversed, 0.6).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Rates stay in [0, 1] for in-range weights, and the decision is
    /// exactly the inclusive threshold comparison.
    #[test]
    fn rates_bounded_and_decision_consistent(
        ballots in prop::collection::vec(
            (0usize..5, 0u8..3, 0.0f64..10.0, 0u64..1_000), 0..12),
        edges in prop::collection::vec((0usize..5, 0usize..5), 0..6),
        threshold in 0.0f64..=1.0,
    ) {
        let net = seed(&ballots, &edges);
        let engine = engine(&net);
        let result = engine.tally(&motion(), &all_remotes(), threshold).unwrap();
        prop_assert!((0.0..=1.0).contains(&result.approval_rate));
        prop_assert!((0.0..=1.0).contains(&result.participation_rate));
        prop_assert!(result.yes_weight <= result.total_weight + 1e-9);
        let expect = if result.approval_rate >= threshold {
            Decision::Accepted
        } else {
            Decision::Rejected
        };
        prop_assert_eq!(result.decision, expect);
    }
}
