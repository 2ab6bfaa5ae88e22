//! Nullable id source — deterministic motion ids and nonces.

use plenum_types::{IdSource, MotionId};
use std::sync::atomic::{AtomicU64, Ordering};

/// An `IdSource` that hands out a predictable sequence.
///
/// Motion ids are `M000001`, `M000002`, … and nonces `n000001`, … so test
/// assertions can name records exactly.
pub struct SeqIds {
    motions: AtomicU64,
    nonces: AtomicU64,
}

impl SeqIds {
    pub fn new() -> Self {
        Self {
            motions: AtomicU64::new(0),
            nonces: AtomicU64::new(0),
        }
    }
}

impl Default for SeqIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SeqIds {
    fn motion_id(&self) -> MotionId {
        let n = self.motions.fetch_add(1, Ordering::SeqCst) + 1;
        MotionId::new(format!("M{n:06}")).expect("sequential id is always valid")
    }

    fn nonce(&self) -> String {
        let n = self.nonces.fetch_add(1, Ordering::SeqCst) + 1;
        format!("n{n:06}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_deterministic() {
        let ids = SeqIds::new();
        assert_eq!(ids.motion_id().as_str(), "M000001");
        assert_eq!(ids.motion_id().as_str(), "M000002");
        assert_eq!(ids.nonce(), "n000001");
        assert_eq!(ids.nonce(), "n000002");
    }
}
