//! The production id source.

use plenum_types::{IdSource, MotionId};
use rand::RngCore;

/// Generates collision-resistant random identifiers.
///
/// Motion ids are `M` plus six lowercase hex characters; nonces are 32 hex
/// characters, so repeated casts by one voter on one motion always land on
/// fresh paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl RandomIds {
    fn hex(&self, bytes: usize) -> String {
        let mut buf = vec![0u8; bytes];
        rand::thread_rng().fill_bytes(&mut buf);
        buf.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl IdSource for RandomIds {
    fn motion_id(&self) -> MotionId {
        MotionId::new(format!("M{}", self.hex(3))).expect("hex id is always valid")
    }

    fn nonce(&self) -> String {
        self.hex(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_types::IdSource as _;

    #[test]
    fn motion_ids_have_expected_shape() {
        let id = RandomIds.motion_id();
        let s = id.as_str();
        assert_eq!(s.len(), 7);
        assert!(s.starts_with('M'));
        assert!(s[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn nonces_are_32_hex_chars() {
        let n = RandomIds.nonce();
        assert_eq!(n.len(), 32);
        assert!(n.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
