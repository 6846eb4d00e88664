//! Canvas-level error taxonomy. None of these are fatal: every variant leaves
//! the canvas drawable and re-savable.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// The actor is not a member of the canvas's school.
    #[error("Annotations are only allowed on your own school's canvas")]
    PermissionDenied,
    /// The store could not be reached or refused the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// The stored document could not be read.
    #[error("Stored canvas was unreadable: {0}")]
    MalformedDocument(String),
    /// A save for this canvas is still in flight.
    #[error("A save is already in progress")]
    SaveInProgress,
    /// The canvas has not finished loading, or is unmounted.
    #[error("Canvas is not ready")]
    NotReady,
    /// The public wall has nothing to save.
    #[error("This canvas is not saved")]
    NotPersistent,
}

impl From<StorageError> for CanvasError {
    fn from(err: StorageError) -> Self {
        CanvasError::StoreUnavailable(err.to_string())
    }
}
