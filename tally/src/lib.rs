//! The tally engine — turns raw ballots and delegations into a decision.
//!
//! A tally is a pure read: it scatter-gathers ballots and delegation edges
//! across every reachable remote, resolves delegation chains, fans
//! resolved ballots in by final effective voter, and computes weighted
//! totals and an accept/reject decision. Repeated tallies over an
//! unchanged ledger (and a fixed clock) are bit-identical.
//!
//! Two legacy behaviors survive here as named, switchable policies —
//! `ResolutionPolicy::ForwardOwnBallot` and `FanInPolicy::Overwrite` —
//! see `plenum_types::params` for what each preserves.

pub mod collect;
pub mod engine;
pub mod resolve;

pub use collect::RawLedger;
pub use engine::{TallyDiagnostics, TallyEngine};
pub use resolve::{build_delegation_map, resolve_chain, Resolution};
