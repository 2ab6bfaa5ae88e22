//! Parliamentary operations for the plenum voting protocol.
//!
//! Four components over one [`plenum_store::RefStore`]:
//! - [`MotionStore`] — proposal records and their isolated content branch
//! - [`DebateLog`] — append-only seconds and arguments (observational)
//! - [`VoteLedger`] — append-only ballots, one store per voter
//! - [`DelegationGraph`] — voter → delegate edges (liquid democracy)
//!
//! Every component owns its injected id source and clock; nothing in this
//! crate keeps process-wide state.

pub mod ballot;
pub mod debate;
pub mod delegation;
pub mod error;
pub mod hooks;
pub mod ids;
pub mod motion;

pub use ballot::{Ballot, VoteLedger};
pub use debate::{DebateEntry, DebateLog};
pub use plenum_store::record::Stance;
pub use delegation::{DelegationEdge, DelegationGraph};
pub use error::ParliamentError;
pub use hooks::{NoHooks, ParliamentHooks};
pub use ids::RandomIds;
pub use motion::{Motion, MotionStore};
