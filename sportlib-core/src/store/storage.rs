//! On-disk layout: `<data_dir>/<collection>.automerge`, one file per entity kind.

use automerge::AutoCommit;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{EntityKind, StoreError};

#[derive(Clone, Debug)]
pub struct DocumentStorage {
    data_dir: PathBuf,
}

impl DocumentStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, kind: EntityKind) -> PathBuf {
        self.data_dir.join(kind.filename())
    }

    /// True once the collection of `kind` has been written.
    pub fn exists(&self, kind: EntityKind) -> bool {
        self.path(kind).exists()
    }

    pub fn create_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::Io(self.data_dir.clone(), e))
    }

    /// Reads the collection document of `kind`. A collection that was never
    /// written starts as an empty document.
    pub fn read(&self, kind: EntityKind) -> Result<AutoCommit, StoreError> {
        let path = self.path(kind);
        match fs::read(&path) {
            Ok(bytes) => AutoCommit::load(&bytes).map_err(|e| StoreError::Load(path, e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AutoCommit::new()),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    /// Writes the full document of `kind`. The data directory must exist.
    pub fn write(&self, kind: EntityKind, doc: &mut AutoCommit) -> Result<(), StoreError> {
        let path = self.path(kind);
        fs::write(&path, doc.save()).map_err(|e| StoreError::Io(path, e))
    }
}
