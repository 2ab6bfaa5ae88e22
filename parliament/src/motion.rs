//! Motion records and their isolated content branches.

use crate::error::ParliamentError;
use crate::hooks::{NoHooks, ParliamentHooks};
use crate::ids::RandomIds;
use plenum_store::record::MotionRecord;
use plenum_store::{paths, Record, RefStore};
use plenum_types::{
    ActorId, Clock, IdSource, MotionId, MotionState, RemoteName, SystemClock, Timestamp,
};
use std::sync::Arc;

/// Maximum motion title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum motion body length in characters.
pub const MAX_BODY_CHARS: usize = 10_000;

/// A proposal subject to vote.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub id: MotionId,
    pub title: String,
    pub body: String,
    pub author: ActorId,
    pub created_at: Timestamp,
    pub state: MotionState,
}

impl Motion {
    fn from_record(record: MotionRecord) -> Result<Self, ParliamentError> {
        let created_at = Timestamp::parse_rfc3339(&record.created_at).ok_or_else(|| {
            plenum_store::StoreError::Malformed {
                path: paths::motion_path(&record.id),
                reason: format!("bad created_at {:?}", record.created_at),
            }
        })?;
        Ok(Self {
            id: record.id,
            title: record.title,
            body: record.body,
            author: record.author,
            created_at,
            state: record.state,
        })
    }

    fn to_record(&self) -> MotionRecord {
        MotionRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            author: self.author.clone(),
            created_at: self.created_at.to_rfc3339(),
            state: self.state,
        }
    }

    /// The content file as committed on the motion's branch.
    pub fn content_markdown(&self) -> String {
        format!("# {}\n\n{}\n", self.title, self.body)
    }
}

/// Creates and reads motions; advances their state monotonically.
///
/// Motion state is owned collectively and advanced only by the merge
/// oracle; everything else treats it as read-only.
pub struct MotionStore<S> {
    store: Arc<S>,
    local: RemoteName,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
    hooks: Arc<dyn ParliamentHooks>,
}

impl<S: RefStore> MotionStore<S> {
    pub fn new(store: Arc<S>, local: RemoteName) -> Self {
        Self {
            store,
            local,
            ids: Arc::new(RandomIds),
            clock: Arc::new(SystemClock),
            hooks: Arc::new(NoHooks),
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

    pub fn with_hooks(mut self, hooks: Arc<dyn ParliamentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Create a motion under a fresh collision-resistant id.
    pub fn create(
        &self,
        title: &str,
        body: &str,
        author: &ActorId,
    ) -> Result<MotionId, ParliamentError> {
        self.create_at(self.ids.motion_id(), title, body, author)
    }

    /// Create a motion under a caller-chosen id. Unlike the default path
    /// this checks for an existing motion first.
    pub fn create_with_id(
        &self,
        id: MotionId,
        title: &str,
        body: &str,
        author: &ActorId,
    ) -> Result<MotionId, ParliamentError> {
        if self.read(&id).is_ok() {
            return Err(ParliamentError::DuplicateMotion(id.to_string()));
        }
        self.create_at(id, title, body, author)
    }

    fn create_at(
        &self,
        id: MotionId,
        title: &str,
        body: &str,
        author: &ActorId,
    ) -> Result<MotionId, ParliamentError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ParliamentError::Validation("motion title is empty".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ParliamentError::Validation(format!(
                "motion title exceeds {MAX_TITLE_CHARS} characters"
            )));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(ParliamentError::Validation(format!(
                "motion body exceeds {MAX_BODY_CHARS} characters"
            )));
        }

        let motion = Motion {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            author: author.clone(),
            created_at: self.clock.now(),
            state: MotionState::Draft,
        };
        let payload = Record::Motion(motion.to_record()).encode()?;
        self.store.put(&paths::motion_path(&id), &payload)?;
        self.store.create_branch(
            &id.branch(),
            &id.content_file(),
            motion.content_markdown().as_bytes(),
            &format!("motion: {id} {title}"),
        )?;

        tracing::info!(motion = %id, author = %author, title, "motion created");
        self.hooks.motion_created(&motion);
        Ok(id)
    }

    /// Fetch a motion by id.
    pub fn get(&self, id: &MotionId) -> Result<Motion, ParliamentError> {
        self.read(id)
    }

    /// Move a motion one rank forward in the state lattice. Backward or
    /// skip transitions fail, and terminal states never move. Because only
    /// single steps are legal, a successful advance doubles as a
    /// compare-and-set claim on the preceding state.
    pub fn advance_state(
        &self,
        id: &MotionId,
        to: MotionState,
    ) -> Result<Motion, ParliamentError> {
        let mut motion = self.read(id)?;
        if !motion.state.can_advance_to(to) {
            return Err(ParliamentError::InvalidTransition {
                from: motion.state,
                to,
            });
        }
        let from = motion.state;
        motion.state = to;
        self.write(&motion)?;
        tracing::info!(motion = %id, %from, %to, "motion state advanced");
        Ok(motion)
    }

    /// Return a `Decided` motion to `Voting`.
    ///
    /// The one sanctioned backward move, reserved for the merge oracle
    /// releasing its claim after a failed enactment. Any other state is an
    /// invalid transition.
    pub fn revert_decision(&self, id: &MotionId) -> Result<Motion, ParliamentError> {
        let mut motion = self.read(id)?;
        if motion.state != MotionState::Decided {
            return Err(ParliamentError::InvalidTransition {
                from: motion.state,
                to: MotionState::Voting,
            });
        }
        motion.state = MotionState::Voting;
        self.write(&motion)?;
        tracing::warn!(motion = %id, "enactment claim released, motion back to voting");
        Ok(motion)
    }

    fn read(&self, id: &MotionId) -> Result<Motion, ParliamentError> {
        let path = paths::motion_path(id);
        let listed = self.store.list_prefix(&self.local, &path)?;
        let content = listed
            .into_iter()
            .find(|(_, p)| *p == path)
            .map(|(c, _)| c)
            .ok_or_else(|| ParliamentError::MotionNotFound(id.to_string()))?;
        let payload = self.store.get(&content)?;
        match Record::decode(&path, &payload)? {
            Record::Motion(record) => Motion::from_record(record),
            _ => Err(plenum_store::StoreError::Malformed {
                path,
                reason: "expected a motion record".into(),
            }
            .into()),
        }
    }

    fn write(&self, motion: &Motion) -> Result<(), ParliamentError> {
        let payload = Record::Motion(motion.to_record()).encode()?;
        self.store.put(&paths::motion_path(&motion.id), &payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_nullables::{MemoryNetwork, NullClock, SeqIds};

    fn remote(name: &str) -> RemoteName {
        RemoteName::new(name).unwrap()
    }

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn store() -> (Arc<MemoryNetwork>, MotionStore<plenum_nullables::MemoryRefStore>) {
        let net = MemoryNetwork::new();
        let handle = Arc::new(net.handle(&remote("chair")));
        let motions = MotionStore::new(handle, remote("chair"))
            .with_ids(Arc::new(SeqIds::new()))
            .with_clock(Arc::new(NullClock::new(1_000)));
        (net, motions)
    }

    #[test]
    fn create_writes_record_and_branch() {
        let (net, motions) = store();
        let id = motions
            .create("Adopt v1.4", "This motion proposes v1.4.", &actor("alice"))
            .unwrap();
        assert_eq!(id.as_str(), "M000001");

        let motion = motions.get(&id).unwrap();
        assert_eq!(motion.title, "Adopt v1.4");
        assert_eq!(motion.state, MotionState::Draft);
        assert_eq!(motion.created_at, Timestamp::new(1_000));

        let snap = net
            .branch_snapshot(&remote("chair"), "motions/M000001")
            .unwrap();
        assert_eq!(snap.file_path, "motions/M000001.md");
        assert_eq!(snap.payload, b"# Adopt v1.4\n\nThis motion proposes v1.4.\n");
        assert_eq!(snap.message, "motion: M000001 Adopt v1.4");
    }

    #[test]
    fn deterministic_id_collision_is_rejected() {
        let (_net, motions) = store();
        let id = MotionId::new("Mfixed1").unwrap();
        motions
            .create_with_id(id.clone(), "t", "b", &actor("alice"))
            .unwrap();
        assert!(matches!(
            motions.create_with_id(id, "t2", "b2", &actor("bob")),
            Err(ParliamentError::DuplicateMotion(_))
        ));
    }

    #[test]
    fn get_missing_motion_fails() {
        let (_net, motions) = store();
        let id = MotionId::new("Mnope00").unwrap();
        assert!(matches!(
            motions.get(&id),
            Err(ParliamentError::MotionNotFound(_))
        ));
    }

    #[test]
    fn state_advances_only_one_rank_forward() {
        let (_net, motions) = store();
        let id = motions.create("t", "b", &actor("alice")).unwrap();

        motions.advance_state(&id, MotionState::Open).unwrap();
        motions.advance_state(&id, MotionState::Voting).unwrap();
        assert!(matches!(
            motions.advance_state(&id, MotionState::Merged),
            Err(ParliamentError::InvalidTransition { .. })
        ));
        motions.advance_state(&id, MotionState::Decided).unwrap();
        let motion = motions.advance_state(&id, MotionState::Merged).unwrap();
        assert_eq!(motion.state, MotionState::Merged);

        // Terminal: nothing moves.
        assert!(motions.advance_state(&id, MotionState::Rejected).is_err());
    }

    #[test]
    fn revert_decision_only_from_decided() {
        let (_net, motions) = store();
        let id = motions.create("t", "b", &actor("alice")).unwrap();
        assert!(motions.revert_decision(&id).is_err());

        motions.advance_state(&id, MotionState::Open).unwrap();
        motions.advance_state(&id, MotionState::Voting).unwrap();
        motions.advance_state(&id, MotionState::Decided).unwrap();
        let motion = motions.revert_decision(&id).unwrap();
        assert_eq!(motion.state, MotionState::Voting);
    }

    #[test]
    fn title_and_body_limits() {
        let (_net, motions) = store();
        assert!(matches!(
            motions.create("   ", "b", &actor("a")),
            Err(ParliamentError::Validation(_))
        ));
        let long_title = "t".repeat(MAX_TITLE_CHARS + 1);
        assert!(motions.create(&long_title, "b", &actor("a")).is_err());
        let long_body = "b".repeat(MAX_BODY_CHARS + 1);
        assert!(motions.create("t", &long_body, &actor("a")).is_err());
    }
}
