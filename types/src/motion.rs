//! Motion identifiers.

use crate::actor::validate_ident;
use crate::error::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A globally unique motion identifier.
///
/// Freshly generated ids are `M` followed by six lowercase hex characters
/// (collision-resistant for parliamentary workloads; callers who need a
/// deterministic id supply their own and accept the duplicate check).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionId(String);

impl MotionId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let s = raw.into();
        validate_ident(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The branch holding this motion's isolated content.
    pub fn branch(&self) -> String {
        format!("motions/{}", self.0)
    }

    /// The markdown file carrying the motion's title and body.
    pub fn content_file(&self) -> String {
        format!("motions/{}.md", self.0)
    }
}

impl fmt::Display for MotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_and_file_names() {
        let id = MotionId::new("M1a2b3c").unwrap();
        assert_eq!(id.branch(), "motions/M1a2b3c");
        assert_eq!(id.content_file(), "motions/M1a2b3c.md");
    }

    #[test]
    fn rejects_slash() {
        assert!(MotionId::new("M1/evil").is_err());
    }
}
