//! The `RefStore` trait — the five-and-a-half primitives the protocol
//! needs from its substrate.

use crate::error::StoreError;
use plenum_types::RemoteName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque reference to an immutable object in the content store
/// (a git object id in the git backend).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "ContentRef({short})")
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backing store abstraction: content-addressable immutable objects behind
/// named refs, plus branch merge/delete for motion enactment.
///
/// One `RefStore` instance is one participant's view: `put` and the branch
/// operations act on that participant's own store; `list_prefix` reads any
/// reachable remote. Implementations must make listed objects retrievable
/// through `get` (fetching them during `list_prefix` if the backend keeps
/// objects remote), and every write must be atomic: a ref either exists
/// pointing at a complete object or does not exist.
pub trait RefStore: Send + Sync {
    /// Write `payload` as an immutable object and point the ref at `path`
    /// to it. Writing an existing path repoints the ref (the old object
    /// stays in the content store); append-only callers guarantee fresh
    /// paths via nonces.
    fn put(&self, path: &str, payload: &[u8]) -> Result<ContentRef, StoreError>;

    /// Read back an immutable object.
    fn get(&self, content: &ContentRef) -> Result<Vec<u8>, StoreError>;

    /// Enumerate `(content, path)` pairs under a path prefix on one remote,
    /// sorted by path. An empty listing is `Ok(vec![])`, not an error;
    /// `StoreError::Unreachable` signals the remote cannot be read at all.
    fn list_prefix(
        &self,
        remote: &RemoteName,
        prefix: &str,
    ) -> Result<Vec<(ContentRef, String)>, StoreError>;

    /// Create an isolated branch containing a single file. This is the
    /// primitive behind motion creation; `merge_branch`/`delete_branch`
    /// presuppose it.
    fn create_branch(
        &self,
        name: &str,
        file_path: &str,
        payload: &[u8],
        message: &str,
    ) -> Result<(), StoreError>;

    /// Merge a branch into the main line. `no_fast_forward` preserves the
    /// branch's history as a distinct lineage.
    fn merge_branch(&self, name: &str, no_fast_forward: bool) -> Result<(), StoreError>;

    /// Discard a branch.
    fn delete_branch(&self, name: &str) -> Result<(), StoreError>;
}
