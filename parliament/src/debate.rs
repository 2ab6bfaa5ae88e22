//! The debate channel — seconds and arguments.
//!
//! Purely observational: records here are never consulted by the tally.
//! Entries append under `debate/{motion}/{nonce}` and nothing overwrites
//! anything.

use crate::error::ParliamentError;
use crate::ids::RandomIds;
use plenum_store::record::{DebateRecord, Stance};
use plenum_store::{paths, Record, RefStore};
use plenum_types::{ActorId, Clock, IdSource, MotionId, RemoteName, SystemClock, Timestamp};
use plenum_utils::stats::{self, StatsCounter};
use std::sync::Arc;

/// Maximum debate argument length in characters.
pub const MAX_ARGUMENT_CHARS: usize = 5_000;

/// One entry from a motion's debate channel.
#[derive(Clone, Debug, PartialEq)]
pub enum DebateEntry {
    Second {
        speaker: ActorId,
        at: Timestamp,
    },
    Argument {
        speaker: ActorId,
        stance: Stance,
        argument: String,
        at: Timestamp,
    },
}

/// Append-only endorsement/argument log attached to a motion.
pub struct DebateLog<S> {
    store: Arc<S>,
    local: RemoteName,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
    stats: Arc<StatsCounter>,
}

impl<S: RefStore> DebateLog<S> {
    pub fn new(store: Arc<S>, local: RemoteName) -> Self {
        Self {
            store,
            local,
            ids: Arc::new(RandomIds),
            clock: Arc::new(SystemClock),
            stats: Arc::new(stats::anomaly_counters()),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsCounter>) -> Self {
        self.stats = stats;
        self
    }

    /// Formally second a motion.
    pub fn second(&self, motion: &MotionId, speaker: &ActorId) -> Result<(), ParliamentError> {
        self.require_motion(motion)?;
        let record = DebateRecord::Second {
            speaker: speaker.clone(),
            timestamp: self.clock.now().to_rfc3339(),
        };
        self.append(motion, record)?;
        tracing::info!(motion = %motion, speaker = %speaker, "motion seconded");
        Ok(())
    }

    /// Add an argument for or against a motion.
    pub fn debate(
        &self,
        motion: &MotionId,
        speaker: &ActorId,
        stance: Stance,
        argument: &str,
    ) -> Result<(), ParliamentError> {
        let argument = argument.trim();
        if argument.is_empty() {
            return Err(ParliamentError::Validation("empty debate argument".into()));
        }
        if argument.chars().count() > MAX_ARGUMENT_CHARS {
            return Err(ParliamentError::Validation(format!(
                "debate argument exceeds {MAX_ARGUMENT_CHARS} characters"
            )));
        }
        self.require_motion(motion)?;
        let record = DebateRecord::Argument {
            speaker: speaker.clone(),
            stance,
            argument: argument.to_string(),
            timestamp: self.clock.now().to_rfc3339(),
        };
        self.append(motion, record)?;
        tracing::info!(motion = %motion, speaker = %speaker, ?stance, "debate entry recorded");
        Ok(())
    }

    /// Read a motion's debate channel from one remote, in append order.
    pub fn minutes(
        &self,
        motion: &MotionId,
        remote: &RemoteName,
    ) -> Result<Vec<DebateEntry>, ParliamentError> {
        let listed = self
            .store
            .list_prefix(remote, &paths::debate_prefix(motion))?;
        let mut entries = Vec::with_capacity(listed.len());
        for (content, path) in listed {
            let payload = match self.store.get(&content) {
                Ok(p) => p,
                Err(e) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, error = %e, "skipping unreadable debate record");
                    continue;
                }
            };
            match Record::decode(&path, &payload) {
                Ok(Record::Debate(record)) => match debate_entry(record) {
                    Some(entry) => entries.push(entry),
                    None => {
                        self.stats.increment(stats::MALFORMED_RECORD);
                        tracing::warn!(%path, "skipping debate record with bad timestamp");
                    }
                },
                Ok(_) | Err(_) => {
                    self.stats.increment(stats::MALFORMED_RECORD);
                    tracing::warn!(%path, "skipping malformed debate record");
                }
            }
        }
        Ok(entries)
    }

    fn append(&self, motion: &MotionId, record: DebateRecord) -> Result<(), ParliamentError> {
        let path = paths::debate_path(motion, &self.ids.nonce());
        let payload = Record::Debate(record).encode()?;
        self.store.put(&path, &payload)?;
        Ok(())
    }

    fn require_motion(&self, motion: &MotionId) -> Result<(), ParliamentError> {
        let path = paths::motion_path(motion);
        let listed = self.store.list_prefix(&self.local, &path)?;
        if listed.iter().any(|(_, p)| *p == path) {
            Ok(())
        } else {
            Err(ParliamentError::MotionNotFound(motion.to_string()))
        }
    }
}

fn debate_entry(record: DebateRecord) -> Option<DebateEntry> {
    match record {
        DebateRecord::Second { speaker, timestamp } => Some(DebateEntry::Second {
            speaker,
            at: Timestamp::parse_rfc3339(&timestamp)?,
        }),
        DebateRecord::Argument {
            speaker,
            stance,
            argument,
            timestamp,
        } => Some(DebateEntry::Argument {
            speaker,
            stance,
            argument,
            at: Timestamp::parse_rfc3339(&timestamp)?,
        }),
    }
}
