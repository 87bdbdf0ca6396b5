//! Repository error types.

use std::fmt;

use thiserror::Error;

use crate::store::{EntityKind, RecordError, StoreError, UnknownKind};

/// The step of a cascade that was being performed when a store error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert,
    Update,
    Remove,
    Load,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Remove => "remove",
            Action::Load => "load",
        };
        write!(f, "{}", s)
    }
}

/// Errors surfaced by [`super::Repository`] operations.
///
/// Cascades are not transactional: when one of these is returned from
/// `add`, `update` or `delete`, the steps before the failing one stay written.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store is closed or could not be opened
    #[error("Store is not available")]
    StoreUnavailable,

    #[error("Failed to open store: {0}")]
    Open(#[source] StoreError),

    #[error("{kind} '{key}' not found")]
    NotFound { kind: EntityKind, key: String },

    #[error("{kind} with key '{key}' already exists")]
    DuplicateKey { kind: EntityKind, key: String },

    #[error(transparent)]
    UnsupportedType(#[from] UnknownKind),

    /// Any other store failure, with the entity it happened on
    #[error("Failed to {action} {kind} '{id}': {source}")]
    Store {
        action: Action,
        kind: EntityKind,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid {kind} record: {source}")]
    Record {
        kind: EntityKind,
        #[source]
        source: RecordError,
    },
}

impl RepositoryError {
    /// Attaches the entity context to a store error.
    pub(crate) fn from_store(action: Action, kind: EntityKind, id: &str, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => RepositoryError::StoreUnavailable,
            StoreError::NotFound(key) => RepositoryError::NotFound { kind, key },
            StoreError::DuplicateKey(key) => RepositoryError::DuplicateKey { kind, key },
            StoreError::Record(source) => RepositoryError::Record { kind, source },
            source => RepositoryError::Store {
                action,
                kind,
                id: id.to_string(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_store_error_context() {
        let err = RepositoryError::from_store(
            Action::Insert,
            EntityKind::RunningUnit,
            "u-1",
            StoreError::Automerge("boom".to_string()),
        );
        assert_eq!(err.to_string(), "Failed to insert RunningUnit 'u-1': Automerge error: boom");
    }

    #[test]
    fn test_store_error_mapping() {
        let err = RepositoryError::from_store(
            Action::Update,
            EntityKind::RunningPlan,
            "p-1",
            StoreError::NotFound("p-1".to_string()),
        );
        assert!(matches!(err, RepositoryError::NotFound { kind: EntityKind::RunningPlan, .. }));

        let err = RepositoryError::from_store(
            Action::Remove,
            EntityKind::Track,
            "t-1",
            StoreError::Unavailable,
        );
        assert!(matches!(err, RepositoryError::StoreUnavailable));

        let err = RepositoryError::from_store(
            Action::Load,
            EntityKind::Track,
            "t-1",
            StoreError::Load(PathBuf::from("tracks.automerge"), "corrupt".to_string()),
        );
        assert!(matches!(err, RepositoryError::Store { action: Action::Load, .. }));
    }
}
