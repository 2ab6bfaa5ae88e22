//! Participant and remote identifiers.
//!
//! Both end up as path segments under `vote/` and `delegate/` refs, so the
//! accepted charset is locked down to `[A-Za-z0-9._-]` with no traversal
//! sequences.

use crate::error::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum byte length of an actor or remote identifier.
pub const MAX_IDENT_LEN: usize = 100;

pub(crate) fn validate_ident(raw: &str) -> Result<(), IdentifierError> {
    if raw.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if raw.len() > MAX_IDENT_LEN {
        return Err(IdentifierError::TooLong {
            len: raw.len(),
            max: MAX_IDENT_LEN,
        });
    }
    if let Some(c) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(IdentifierError::BadCharacter(c));
    }
    if raw.starts_with('.') || raw.contains("..") {
        return Err(IdentifierError::PathTraversal);
    }
    Ok(())
}

/// A participant in the parliament: an author, speaker, voter, or delegate.
///
/// One actor owns exactly one remote store, so the same identifier names
/// both the participant and the namespace their ballots live under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = raw.into();
        validate_ident(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name or URL of an independently-owned, append-only store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteName(String);

impl RemoteName {
    /// Remote names may also be URLs or filesystem paths, so only emptiness
    /// is rejected here; backends apply their own addressing rules.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = raw.into();
        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
