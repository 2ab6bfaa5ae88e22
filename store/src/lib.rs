//! Abstract storage contract for the plenum voting protocol.
//!
//! The protocol runs against any backend offering content-addressable
//! immutable objects, named refs with prefix enumeration, and branch
//! merge/delete. The canonical backend is a git repository
//! (`plenum-store-git`); tests run on an in-memory network
//! (`plenum-nullables`). Everything above this crate depends only on the
//! [`RefStore`] trait.

pub mod error;
pub mod paths;
pub mod record;
pub mod refstore;

pub use error::StoreError;
pub use record::{BallotRecord, DebateRecord, MotionRecord, Record, Stance};
pub use refstore::{ContentRef, RefStore};
