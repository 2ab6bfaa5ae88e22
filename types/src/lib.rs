//! Fundamental types for the plenum voting protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: participant and motion identifiers, timestamps, vote values,
//! the motion state lattice, protocol parameters, and the injectable clock
//! and id-source seams.

pub mod actor;
pub mod clock;
pub mod error;
pub mod ids;
pub mod motion;
pub mod params;
pub mod state;
pub mod tally;
pub mod time;
pub mod vote;

pub use actor::{ActorId, RemoteName};
pub use clock::{Clock, SystemClock};
pub use error::IdentifierError;
pub use ids::IdSource;
pub use motion::MotionId;
pub use params::{
    DedupPolicy, FanInPolicy, ParamsError, ParliamentParams, ResolutionPolicy, ValidationMode,
};
pub use state::MotionState;
pub use tally::{Decision, TallyResult};
pub use time::Timestamp;
pub use vote::VoteValue;
