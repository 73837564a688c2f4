use thiserror::Error;

use super::event::ValidationError;
use crate::database::StoreError;
use crate::permissions::LookupError;
use crate::state::CommitError;

/// Why an event could not be processed.
///
/// Nothing was mutated and no actions were produced. Everything except
/// `Validation` is worth retrying.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("config store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    AdminLookup(#[from] LookupError),
    #[error("too many concurrent updates to {kind} {key}")]
    Contention { kind: &'static str, key: String },
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EngineError::Validation(_))
    }
}

impl From<CommitError> for EngineError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::Store(e) => EngineError::Store(e),
            CommitError::Contention { kind, key } => EngineError::Contention { kind, key },
        }
    }
}
