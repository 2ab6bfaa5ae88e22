//! Nullable ref store — an in-memory multi-remote network.
//!
//! Models the substrate the protocol actually runs on: a shared content-
//! addressable object pool (sha-256 addressed, like the real backend) with
//! one ref namespace and one branch set per participant. Remotes can be
//! marked unreachable and branch operations can be forced to fail, so
//! tally skip semantics and enactment failure paths are testable without a
//! filesystem.

use plenum_store::{ContentRef, RefStore, StoreError};
use plenum_types::RemoteName;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// What a branch carries: the single committed file and its commit message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchSnapshot {
    pub file_path: String,
    pub payload: Vec<u8>,
    pub message: String,
}

#[derive(Default)]
struct NetworkState {
    /// Content-addressed objects, shared across the whole network.
    objects: HashMap<String, Vec<u8>>,
    /// Per-remote ref maps; BTreeMap keeps listings path-sorted.
    refs: HashMap<RemoteName, BTreeMap<String, ContentRef>>,
    /// Per-remote branch sets.
    branches: HashMap<RemoteName, BTreeMap<String, BranchSnapshot>>,
    /// Per-remote log of merged branch names, in merge order.
    merged: HashMap<RemoteName, Vec<String>>,
    /// Remotes currently unreachable.
    down: HashSet<RemoteName>,
    /// Force the next branch operations to fail (enactment failure tests).
    fail_branch_ops: bool,
}

/// The shared in-memory network. Create once, then hand out one
/// [`MemoryRefStore`] per participant.
pub struct MemoryNetwork {
    state: Mutex<NetworkState>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(NetworkState::default()),
        })
    }

    /// A participant's handle: `put` and branch operations act on
    /// `local`'s own namespace.
    pub fn handle(self: &Arc<Self>, local: &RemoteName) -> MemoryRefStore {
        MemoryRefStore {
            network: Arc::clone(self),
            local: local.clone(),
        }
    }

    /// Mark a remote unreachable (or reachable again).
    pub fn set_down(&self, remote: &RemoteName, down: bool) {
        let mut state = self.state.lock().unwrap();
        if down {
            state.down.insert(remote.clone());
        } else {
            state.down.remove(remote);
        }
    }

    /// Make subsequent merge/delete branch operations fail.
    pub fn set_fail_branch_ops(&self, fail: bool) {
        self.state.lock().unwrap().fail_branch_ops = fail;
    }

    /// Branch names merged on `remote`, in merge order.
    pub fn merged_branches(&self, remote: &RemoteName) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .merged
            .get(remote)
            .cloned()
            .unwrap_or_default()
    }

    /// The file a branch carries, if the branch exists.
    pub fn branch_snapshot(&self, remote: &RemoteName, name: &str) -> Option<BranchSnapshot> {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(remote)
            .and_then(|b| b.get(name))
            .cloned()
    }

    /// Whether `remote` still carries a branch.
    pub fn has_branch(&self, remote: &RemoteName, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(remote)
            .is_some_and(|b| b.contains_key(name))
    }
}

fn address(payload: &[u8]) -> ContentRef {
    let digest = Sha256::digest(payload);
    ContentRef::new(hex::encode(digest))
}

/// One participant's view of a [`MemoryNetwork`].
pub struct MemoryRefStore {
    network: Arc<MemoryNetwork>,
    local: RemoteName,
}

impl MemoryRefStore {
    pub fn local(&self) -> &RemoteName {
        &self.local
    }

    pub fn network(&self) -> &Arc<MemoryNetwork> {
        &self.network
    }
}

impl RefStore for MemoryRefStore {
    fn put(&self, path: &str, payload: &[u8]) -> Result<ContentRef, StoreError> {
        let content = address(payload);
        let mut state = self.network.state.lock().unwrap();
        state
            .objects
            .insert(content.as_str().to_string(), payload.to_vec());
        state
            .refs
            .entry(self.local.clone())
            .or_default()
            .insert(path.to_string(), content.clone());
        Ok(content)
    }

    fn get(&self, content: &ContentRef) -> Result<Vec<u8>, StoreError> {
        self.network
            .state
            .lock()
            .unwrap()
            .objects
            .get(content.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(content.to_string()))
    }

    fn list_prefix(
        &self,
        remote: &RemoteName,
        prefix: &str,
    ) -> Result<Vec<(ContentRef, String)>, StoreError> {
        let state = self.network.state.lock().unwrap();
        if state.down.contains(remote) {
            return Err(StoreError::Unreachable(remote.to_string()));
        }
        let Some(refs) = state.refs.get(remote) else {
            // A known-but-empty participant store lists as empty.
            return Ok(Vec::new());
        };
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, content)| (content.clone(), path.clone()))
            .collect())
    }

    fn create_branch(
        &self,
        name: &str,
        file_path: &str,
        payload: &[u8],
        message: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.network.state.lock().unwrap();
        let branches = state.branches.entry(self.local.clone()).or_default();
        if branches.contains_key(name) {
            return Err(StoreError::Duplicate(name.to_string()));
        }
        branches.insert(
            name.to_string(),
            BranchSnapshot {
                file_path: file_path.to_string(),
                payload: payload.to_vec(),
                message: message.to_string(),
            },
        );
        Ok(())
    }

    fn merge_branch(&self, name: &str, _no_fast_forward: bool) -> Result<(), StoreError> {
        let mut state = self.network.state.lock().unwrap();
        if state.fail_branch_ops {
            return Err(StoreError::Backend(format!("merge of {name} failed")));
        }
        let exists = state
            .branches
            .get(&self.local)
            .is_some_and(|b| b.contains_key(name));
        if !exists {
            return Err(StoreError::NotFound(name.to_string()));
        }
        state
            .merged
            .entry(self.local.clone())
            .or_default()
            .push(name.to_string());
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.network.state.lock().unwrap();
        if state.fail_branch_ops {
            return Err(StoreError::Backend(format!("delete of {name} failed")));
        }
        let removed = state
            .branches
            .get_mut(&self.local)
            .and_then(|b| b.remove(name));
        if removed.is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
