//! Lifecycle hook points.
//!
//! The boundary for external observability layers (telemetry, dashboards):
//! they subscribe here and the protocol stays free of emission concerns.
//! Every method is a no-op by default.

use crate::motion::Motion;
use plenum_types::{ActorId, Decision, MotionId, TallyResult, VoteValue};

/// Observer for protocol lifecycle events.
///
/// Implementations must not fail: hook errors have nowhere to go, so
/// observers handle their own.
pub trait ParliamentHooks: Send + Sync {
    fn motion_created(&self, _motion: &Motion) {}

    fn ballot_cast(&self, _motion: &MotionId, _voter: &ActorId, _value: VoteValue, _weight: f64) {}

    fn delegation_created(&self, _delegator: &ActorId, _delegate: &ActorId) {}

    fn tally_computed(&self, _result: &TallyResult) {}

    fn decision_enacted(&self, _motion: &MotionId, _decision: Decision) {}
}

/// The default observer: nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl ParliamentHooks for NoHooks {}
