use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate ref: {0}")]
    Duplicate(String),

    #[error("remote {0} is unreachable")]
    Unreachable(String),

    #[error("malformed record at {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether a tally may skip past this error (unreachable remote)
    /// rather than aborting.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}
