//! Sportlib Core Library
//!
//! Domain model and persistence for running plans, trainings and tracks.

pub mod export;
pub mod identifier;
pub mod library;
pub mod models;
pub mod repository;
pub mod store;
pub mod templates;

pub use identifier::Identifier;
pub use library::{LibraryError, SportsLibrary};
pub use models::{
    LocationData, MovementType, RunningPlan, RunningPlanEntry, RunningUnit, Track, Training,
    TrainingType, User,
};
pub use repository::{Action, Cascade, Repository, RepositoryError};
pub use store::{Database, Entity, EntityKind, FieldValue, Record, RecordError, StoreError};
pub use templates::{ImportSummary, TemplateError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
