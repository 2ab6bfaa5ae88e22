use plenum_store::StoreError;
use plenum_types::{IdentifierError, MotionState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParliamentError {
    #[error("motion {0} not found")]
    MotionNotFound(String),

    #[error("motion {0} already exists")]
    DuplicateMotion(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: MotionState,
        to: MotionState,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot delegate to self")]
    SelfDelegation,

    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
