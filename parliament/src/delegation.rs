//! Vote delegation — entrust voting weight to another participant.
//!
//! Each delegator owns exactly one edge, stored as `delegate/{delegator}`
//! in their own store with the delegate's plain identifier as the payload
//! (the format ledgers already in the field carry). Writing again repoints
//! the ref, so the stored edge is always the delegator's most recent
//! choice; the superseded object stays in the content store as an audit
//! trail.

use crate::error::ParliamentError;
use crate::hooks::{NoHooks, ParliamentHooks};
use plenum_store::{paths, Record, RefStore};
use plenum_types::{ActorId, RemoteName};
use plenum_utils::stats::{self, StatsCounter};
use std::sync::Arc;

/// A voter → delegate edge, attributed to the remote it was read from.
///
/// The wire payload is the bare delegate id, so recency cannot ride along;
/// cross-remote conflicts for one delegator are resolved by the tally's
/// deterministic source ordering instead (the delegator's own remote is
/// authoritative, then last in gather order).
#[derive(Clone, Debug, PartialEq)]
pub struct DelegationEdge {
    pub delegator: ActorId,
    pub delegate: ActorId,
    pub source: RemoteName,
}

/// Writes delegation edges to the delegator's own store and reads the
/// global edge set back from any remote.
pub struct DelegationGraph<S> {
    store: Arc<S>,
    hooks: Arc<dyn ParliamentHooks>,
    stats: Arc<StatsCounter>,
}

impl<S: RefStore> DelegationGraph<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            hooks: Arc::new(NoHooks),
            stats: Arc::new(stats::anomaly_counters()),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ParliamentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsCounter>) -> Self {
        self.stats = stats;
        self
    }

    /// Declare (or replace) the delegator's edge. Delegation is global,
    /// not motion-scoped, and a later call supersedes the earlier one.
    pub fn delegate(
        &self,
        delegator: &ActorId,
        delegate: &ActorId,
    ) -> Result<(), ParliamentError> {
        if delegator == delegate {
            return Err(ParliamentError::SelfDelegation);
        }
        let payload = Record::Delegation(delegate.clone()).encode()?;
        self.store.put(&paths::delegate_path(delegator), &payload)?;

        tracing::info!(delegator = %delegator, delegate = %delegate, "delegation recorded");
        self.hooks.delegation_created(delegator, delegate);
        Ok(())
    }

    /// List all delegation edges visible on one remote.
    pub fn enumerate(&self, remote: &RemoteName) -> Result<Vec<DelegationEdge>, ParliamentError> {
        let listed = self.store.list_prefix(remote, &paths::delegate_prefix())?;
        let mut edges = Vec::with_capacity(listed.len());
        for (content, path) in listed {
            let Some(delegator) = paths::parse_delegate_path(&path) else {
                self.stats.increment(stats::MALFORMED_RECORD);
                tracing::warn!(%path, "skipping ref with unparseable delegation path");
                continue;
            };
            let payload = match self.store.get(&content) {
                Ok(p) => p,
                Err(e) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, error = %e, "skipping unreadable delegation");
                    continue;
                }
            };
            match Record::decode(&path, &payload) {
                Ok(Record::Delegation(delegate)) => edges.push(DelegationEdge {
                    delegator,
                    delegate,
                    source: remote.clone(),
                }),
                Ok(_) | Err(_) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, "skipping malformed delegation record");
                }
            }
        }
        Ok(edges)
    }
}
