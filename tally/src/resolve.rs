//! Delegation map construction and chain resolution.

use plenum_parliament::DelegationEdge;
use plenum_types::ActorId;
use std::collections::{HashMap, HashSet};

/// Fold the gathered edges into one edge per delegator.
///
/// An edge read from the delegator's own remote (remote name equals the
/// delegator id) is authoritative and cannot be displaced. Among foreign
/// copies, the last one in gather order wins (the legacy behavior),
/// which is deterministic because gather order is caller remote order.
pub fn build_delegation_map(edges: &[DelegationEdge]) -> HashMap<ActorId, ActorId> {
    let mut map: HashMap<ActorId, (ActorId, bool)> = HashMap::new();
    for edge in edges {
        let own = edge.source.as_str() == edge.delegator.as_str();
        match map.get(&edge.delegator) {
            Some((_, existing_own)) if *existing_own && !own => {}
            _ => {
                map.insert(edge.delegator.clone(), (edge.delegate.clone(), own));
            }
        }
    }
    map.into_iter()
        .map(|(delegator, (delegate, _))| (delegator, delegate))
        .collect()
}

/// Outcome of following one voter's delegation chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The final effective voter (the last valid hop).
    pub effective: ActorId,
    /// Hops taken.
    pub depth: usize,
    /// The chain revisited a voter; resolution stopped there.
    pub cycle: bool,
    /// The chain was cut off at max depth while edges remained.
    pub truncated: bool,
}

/// Follow the delegation map from `start` until the chain ends, revisits a
/// voter, or `max_depth` hops have been taken. Never fails: a cycle or an
/// over-deep chain truncates at the last valid hop and is flagged.
pub fn resolve_chain(
    start: &ActorId,
    map: &HashMap<ActorId, ActorId>,
    max_depth: usize,
) -> Resolution {
    let mut current = start.clone();
    let mut visited: HashSet<ActorId> = HashSet::new();
    let mut depth = 0;

    while depth < max_depth {
        let Some(next) = map.get(&current) else {
            return Resolution {
                effective: current,
                depth,
                cycle: false,
                truncated: false,
            };
        };
        if !visited.insert(current.clone()) {
            return Resolution {
                effective: current,
                depth,
                cycle: true,
                truncated: false,
            };
        }
        current = next.clone();
        depth += 1;
    }

    // Out of depth budget. If edges remain (or we are back on a visited
    // voter), the chain was genuinely cut short.
    let truncated = map.contains_key(&current);
    let cycle = truncated && visited.contains(&current);
    Resolution {
        effective: current,
        depth,
        cycle,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_types::RemoteName;

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn edge(delegator: &str, delegate: &str, source: &str) -> DelegationEdge {
        DelegationEdge {
            delegator: actor(delegator),
            delegate: actor(delegate),
            source: RemoteName::new(source).unwrap(),
        }
    }

    fn map_of(pairs: &[(&str, &str)]) -> HashMap<ActorId, ActorId> {
        pairs
            .iter()
            .map(|(a, b)| (actor(a), actor(b)))
            .collect()
    }

    #[test]
    fn own_remote_edge_is_authoritative() {
        let edges = vec![
            edge("bob", "carol", "bob"),
            edge("bob", "mallory", "mirror"),
        ];
        let map = build_delegation_map(&edges);
        assert_eq!(map[&actor("bob")], actor("carol"));

        // Own-remote copy arriving later still wins.
        let edges = vec![
            edge("bob", "mallory", "mirror"),
            edge("bob", "carol", "bob"),
        ];
        let map = build_delegation_map(&edges);
        assert_eq!(map[&actor("bob")], actor("carol"));
    }

    #[test]
    fn foreign_copies_resolve_last_wins() {
        let edges = vec![
            edge("bob", "carol", "mirror1"),
            edge("bob", "dave", "mirror2"),
        ];
        let map = build_delegation_map(&edges);
        assert_eq!(map[&actor("bob")], actor("dave"));
    }

    #[test]
    fn no_delegation_resolves_to_self() {
        let map = map_of(&[]);
        let r = resolve_chain(&actor("alice"), &map, 10);
        assert_eq!(r.effective, actor("alice"));
        assert_eq!(r.depth, 0);
        assert!(!r.cycle && !r.truncated);
    }

    #[test]
    fn transitive_chain_resolves_to_end() {
        let map = map_of(&[("a", "b"), ("b", "c")]);
        let r = resolve_chain(&actor("a"), &map, 10);
        assert_eq!(r.effective, actor("c"));
        assert_eq!(r.depth, 2);
        assert!(!r.cycle && !r.truncated);
    }

    #[test]
    fn cycle_terminates_at_revisited_voter() {
        let map = map_of(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let r = resolve_chain(&actor("a"), &map, 10);
        // a -> b -> c -> a, then a is seen again: stop at a, flagged.
        assert_eq!(r.effective, actor("a"));
        assert_eq!(r.depth, 3);
        assert!(r.cycle);
    }

    #[test]
    fn two_cycle_terminates() {
        let map = map_of(&[("a", "b"), ("b", "a")]);
        let r = resolve_chain(&actor("a"), &map, 10);
        assert_eq!(r.effective, actor("a"));
        assert!(r.cycle);
    }

    #[test]
    fn over_deep_chain_truncates() {
        let pairs: Vec<(String, String)> = (0..20)
            .map(|i| (format!("w{i}"), format!("w{}", i + 1)))
            .collect();
        let map: HashMap<ActorId, ActorId> = pairs
            .iter()
            .map(|(a, b)| (actor(a), actor(b)))
            .collect();
        let r = resolve_chain(&actor("w0"), &map, 10);
        assert_eq!(r.effective, actor("w10"));
        assert_eq!(r.depth, 10);
        assert!(r.truncated);
        assert!(!r.cycle);
    }

    #[test]
    fn chain_ending_exactly_at_max_depth_is_complete() {
        let map = map_of(&[("a", "b"), ("b", "c")]);
        let r = resolve_chain(&actor("a"), &map, 2);
        assert_eq!(r.effective, actor("c"));
        assert!(!r.truncated);
    }
}
