//! Library handle: one opened store plus its repository.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::repository::{Repository, RepositoryError};
use crate::store::EntityKind;
use crate::templates::{self, ImportSummary, TemplateError};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("First-run template import failed: {0}")]
    Import(#[source] TemplateError),
}

/// An opened sports library.
///
/// Construct one per data directory and pass it by reference. The first open
/// of an empty directory imports the bundled templates.
pub struct SportsLibrary {
    repository: Repository,
    data_dir: PathBuf,
    first_run: Option<ImportSummary>,
}

impl SportsLibrary {
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let data_dir = data_dir.into();
        let repository = Repository::open(data_dir.clone())?;

        let first_run = if repository
            .database()
            .collection_exists(EntityKind::MovementType)
        {
            None
        } else {
            tracing::info!("First run in {}, importing templates", data_dir.display());
            Some(templates::import_bundled(&repository).map_err(LibraryError::Import)?)
        };

        Ok(Self {
            repository,
            data_dir,
            first_run,
        })
    }

    /// Platform data directory for a library called `name`
    /// (`~/.local/share/<name>` on Linux).
    pub fn default_data_dir(name: &str) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(name)
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// What the first-run import added, if this open performed it.
    pub fn first_run(&self) -> Option<ImportSummary> {
        self.first_run
    }

    pub fn close(&mut self) {
        self.repository.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovementType, RunningPlan};
    use tempfile::TempDir;

    #[test]
    fn test_first_open_imports_templates() {
        let temp_dir = TempDir::new().unwrap();
        let library = SportsLibrary::open(temp_dir.path()).unwrap();

        let summary = library.first_run().unwrap();
        assert!(summary.movement_types > 0);
        let plans: Vec<RunningPlan> = library.repository().find_all().unwrap();
        assert_eq!(plans.len(), summary.running_plans);
    }

    #[test]
    fn test_second_open_does_not_import() {
        let temp_dir = TempDir::new().unwrap();
        {
            let library = SportsLibrary::open(temp_dir.path()).unwrap();
            library
                .repository()
                .delete(&MovementType::with_key("T"))
                .unwrap();
        }

        let library = SportsLibrary::open(temp_dir.path()).unwrap();
        assert!(library.first_run().is_none());
        assert!(library
            .repository()
            .find_by_key::<MovementType>("T")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_close() {
        let temp_dir = TempDir::new().unwrap();
        let mut library = SportsLibrary::open(temp_dir.path()).unwrap();
        library.close();
        assert!(!library.repository().is_open());
        assert_eq!(library.data_dir(), temp_dir.path());
    }

    #[test]
    fn test_default_data_dir_uses_name() {
        assert!(SportsLibrary::default_data_dir("sportlib").ends_with("sportlib"));
    }
}
