//! The ref-path schema.
//!
//! Persisted record locations, kept stable so ledgers already in the
//! field stay readable:
//!
//! - `vote/{motion_id}/{voter_id}/{nonce}` — one ballot
//! - `delegate/{delegator_id}` — current delegation edge
//! - `debate/{motion_id}/{nonce}` — one debate entry (second or argument)
//! - `motion/{motion_id}` — motion metadata record

use plenum_types::{ActorId, MotionId};

pub const VOTE_ROOT: &str = "vote";
pub const DELEGATE_ROOT: &str = "delegate";
pub const DEBATE_ROOT: &str = "debate";
pub const MOTION_ROOT: &str = "motion";

pub fn vote_prefix(motion: &MotionId) -> String {
    format!("{VOTE_ROOT}/{motion}/")
}

pub fn vote_path(motion: &MotionId, voter: &ActorId, nonce: &str) -> String {
    format!("{VOTE_ROOT}/{motion}/{voter}/{nonce}")
}

pub fn delegate_prefix() -> String {
    format!("{DELEGATE_ROOT}/")
}

pub fn delegate_path(delegator: &ActorId) -> String {
    format!("{DELEGATE_ROOT}/{delegator}")
}

pub fn debate_prefix(motion: &MotionId) -> String {
    format!("{DEBATE_ROOT}/{motion}/")
}

pub fn debate_path(motion: &MotionId, nonce: &str) -> String {
    format!("{DEBATE_ROOT}/{motion}/{nonce}")
}

pub fn motion_path(motion: &MotionId) -> String {
    format!("{MOTION_ROOT}/{motion}")
}

/// Split a ballot path into `(motion, voter, nonce)`.
pub fn parse_vote_path(path: &str) -> Option<(MotionId, ActorId, String)> {
    let mut parts = path.split('/');
    if parts.next()? != VOTE_ROOT {
        return None;
    }
    let motion = MotionId::new(parts.next()?).ok()?;
    let voter = ActorId::new(parts.next()?).ok()?;
    let nonce = parts.next()?.to_string();
    if nonce.is_empty() || parts.next().is_some() {
        return None;
    }
    Some((motion, voter, nonce))
}

/// Extract the delegator from a delegation path.
pub fn parse_delegate_path(path: &str) -> Option<ActorId> {
    let rest = path.strip_prefix(DELEGATE_ROOT)?.strip_prefix('/')?;
    if rest.contains('/') {
        return None;
    }
    ActorId::new(rest).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(s: &str) -> MotionId {
        MotionId::new(s).unwrap()
    }

    fn actor(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    #[test]
    fn vote_path_roundtrip() {
        let path = vote_path(&motion("Mabc123"), &actor("alice"), "deadbeef");
        assert_eq!(path, "vote/Mabc123/alice/deadbeef");
        let (m, v, n) = parse_vote_path(&path).unwrap();
        assert_eq!(m.as_str(), "Mabc123");
        assert_eq!(v.as_str(), "alice");
        assert_eq!(n, "deadbeef");
    }

    #[test]
    fn vote_path_rejects_wrong_shape() {
        assert!(parse_vote_path("vote/Mabc123/alice").is_none());
        assert!(parse_vote_path("vote/Mabc123/alice/n/extra").is_none());
        assert!(parse_vote_path("delegate/alice").is_none());
    }

    #[test]
    fn delegate_path_roundtrip() {
        let path = delegate_path(&actor("bob"));
        assert_eq!(path, "delegate/bob");
        assert_eq!(parse_delegate_path(&path).unwrap().as_str(), "bob");
        assert!(parse_delegate_path("delegate/a/b").is_none());
    }
}
