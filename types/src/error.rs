use thiserror::Error;

/// Rejection reasons for participant, remote, and motion identifiers.
///
/// Identifiers embed into ref paths on the backing store, so these rules
/// are structural and enforced in every validation mode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is too long: {len} > {max} bytes")]
    TooLong { len: usize, max: usize },

    #[error("identifier contains disallowed character {0:?}")]
    BadCharacter(char),

    #[error("identifier may not start with '.' or contain '..'")]
    PathTraversal,
}
