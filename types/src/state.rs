//! The motion state lattice.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a motion. Transitions are monotonic: a motion only
/// moves forward one rank at a time, and the terminal states never move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    /// Being drafted; not yet visible for debate.
    Draft,
    /// Open for seconding and debate.
    Open,
    /// Ballots are being accepted.
    Voting,
    /// A tally decision exists; enactment is in flight.
    Decided,
    /// Accepted and merged into the main line. Terminal.
    Merged,
    /// Rejected and discarded. Terminal.
    Rejected,
}

impl MotionState {
    /// Position in the lattice. Merged and Rejected share the final rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Open => 1,
            Self::Voting => 2,
            Self::Decided => 3,
            Self::Merged | Self::Rejected => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Rejected)
    }

    /// Whether ballots may still be cast.
    pub fn accepts_ballots(&self) -> bool {
        matches!(self, Self::Voting)
    }

    /// A single forward step in the lattice. Skips and backward moves are
    /// invalid, as is any move out of a terminal state.
    pub fn can_advance_to(&self, next: MotionState) -> bool {
        !self.is_terminal() && next.rank() == self.rank() + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Open => "open",
            Self::Voting => "voting",
            Self::Decided => "decided",
            Self::Merged => "merged",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MotionState::*;

    #[test]
    fn forward_single_steps_allowed() {
        assert!(Draft.can_advance_to(Open));
        assert!(Open.can_advance_to(Voting));
        assert!(Voting.can_advance_to(Decided));
        assert!(Decided.can_advance_to(Merged));
        assert!(Decided.can_advance_to(Rejected));
    }

    #[test]
    fn skips_and_backward_moves_rejected() {
        assert!(!Draft.can_advance_to(Voting));
        assert!(!Open.can_advance_to(Merged));
        assert!(!Voting.can_advance_to(Open));
        assert!(!Decided.can_advance_to(Voting));
    }

    #[test]
    fn terminal_states_never_move() {
        for next in [Draft, Open, Voting, Decided, Merged, Rejected] {
            assert!(!Merged.can_advance_to(next));
            assert!(!Rejected.can_advance_to(next));
        }
        assert!(Merged.is_terminal());
        assert!(Rejected.is_terminal());
    }
}
