//! Injectable id generation seam.
//!
//! Motion ids and ballot nonces come from an `IdSource` owned by the
//! component instance — never from a process-wide counter — so independent
//! parliaments in one process cannot observe each other, and tests can
//! substitute a deterministic sequence.

use crate::motion::MotionId;

/// A source of fresh identifiers.
pub trait IdSource: Send + Sync {
    /// A fresh motion id (`M` + 6 lowercase hex chars by convention).
    fn motion_id(&self) -> MotionId;

    /// A fresh nonce for uniquely namespacing a ballot or debate record.
    fn nonce(&self) -> String;
}
