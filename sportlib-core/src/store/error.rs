use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::record::RecordError;

/// Errors that can occur in the entity store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database handle is closed.
    #[error("Store is not open")]
    Unavailable,

    #[error("A record with key '{0}' already exists")]
    DuplicateKey(String),

    #[error("No record with key '{0}'")]
    NotFound(String),

    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to load document {}: {}", .0.display(), .1)]
    Load(PathBuf, String),

    #[error("Automerge error: {0}")]
    Automerge(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}
