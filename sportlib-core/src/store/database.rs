//! Open/close database handle and typed per-kind collections.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use automerge::AutoCommit;

use super::codec;
use super::record::{Entity, FieldValue, Record};
use super::storage::DocumentStorage;
use super::{EntityKind, StoreError};

/// Handle to the embedded document store.
///
/// Collection documents are loaded lazily and kept in memory while the handle
/// is open; every mutation is written back to disk immediately. The handle is
/// single-threaded (it is neither `Sync` nor reentrant).
pub struct Database {
    storage: DocumentStorage,
    docs: RefCell<HashMap<EntityKind, AutoCommit>>,
    open: bool,
}

impl Database {
    /// Opens (and creates if needed) a store in `data_dir`.
    pub fn open(data_dir: PathBuf) -> Result<Self, StoreError> {
        let storage = DocumentStorage::new(data_dir);
        storage.create_dir()?;
        tracing::debug!("Opened store at {}", storage.data_dir().display());

        Ok(Self {
            storage,
            docs: RefCell::new(HashMap::new()),
            open: true,
        })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Closes the handle. Subsequent operations fail with [`StoreError::Unavailable`].
    pub fn close(&mut self) {
        if self.open {
            self.docs.borrow_mut().clear();
            self.open = false;
            tracing::debug!("Closed store at {}", self.storage.data_dir().display());
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.storage.data_dir()
    }

    /// True if the collection for `kind` has ever been written to disk.
    pub fn collection_exists(&self, kind: EntityKind) -> bool {
        self.storage.exists(kind)
    }

    /// Typed view of the collection storing `T`.
    pub fn collection<T: Entity>(&self) -> Collection<'_, T> {
        Collection {
            db: self,
            _marker: PhantomData,
        }
    }

    fn with_doc<R>(
        &self,
        kind: EntityKind,
        f: impl FnOnce(&AutoCommit) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        if !self.open {
            return Err(StoreError::Unavailable);
        }

        let mut docs = self.docs.borrow_mut();
        let doc = match docs.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.storage.read(kind)?),
        };
        f(doc)
    }

    fn with_doc_mut<R>(
        &self,
        kind: EntityKind,
        f: impl FnOnce(&mut AutoCommit) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        if !self.open {
            return Err(StoreError::Unavailable);
        }

        let mut docs = self.docs.borrow_mut();
        let doc = match docs.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.storage.read(kind)?),
        };

        let result = f(doc).and_then(|value| {
            self.storage.write(kind, doc)?;
            Ok(value)
        });

        if result.is_err() {
            // Reload from disk on next access instead of keeping a half-applied change
            docs.remove(&kind);
        }
        result
    }
}

/// Key-collection table for one entity type.
pub struct Collection<'a, T> {
    db: &'a Database,
    _marker: PhantomData<T>,
}

impl<T: Entity> Collection<'_, T> {
    /// Adds a new record. Fails with [`StoreError::DuplicateKey`] if the key is taken.
    pub fn insert(&self, entity: &T) -> Result<(), StoreError> {
        let key = entity.key();
        let record = entity.to_record();

        self.db.with_doc_mut(T::KIND, |doc| {
            if codec::contains_key(doc, &key)? {
                return Err(StoreError::DuplicateKey(key.clone()));
            }
            codec::write_record(doc, &key, &record)
        })
    }

    /// Replaces the record with the entity's key. Fails with [`StoreError::NotFound`] if absent.
    pub fn update(&self, entity: &T) -> Result<(), StoreError> {
        let key = entity.key();
        let record = entity.to_record();

        self.db.with_doc_mut(T::KIND, |doc| {
            if !codec::contains_key(doc, &key)? {
                return Err(StoreError::NotFound(key.clone()));
            }
            codec::write_record(doc, &key, &record)
        })
    }

    /// Deletes the record with the entity's key.
    pub fn remove(&self, entity: &T) -> Result<(), StoreError> {
        self.remove_key(&entity.key())
    }

    pub fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        self.db.with_doc_mut(T::KIND, |doc| {
            if codec::delete_record(doc, key)? {
                Ok(())
            } else {
                Err(StoreError::NotFound(key.to_string()))
            }
        })
    }

    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.db.with_doc(T::KIND, |doc| codec::contains_key(doc, key))
    }

    pub fn find_record(&self, key: &str) -> Result<Option<Record>, StoreError> {
        self.db.with_doc(T::KIND, |doc| codec::read_record(doc, key))
    }

    /// Returns the record stored under `key`, decoded without resolving references.
    pub fn find_by_key(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.find_record(key)? {
            Some(record) => Ok(Some(T::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Looks up a record by its `id` field, for kinds keyed on something else.
    ///
    /// More than one match is an integrity problem: it is logged and nothing
    /// is returned.
    pub fn find_record_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let mut matches = self.find_records_by_attribute("id", &FieldValue::Text(id.to_string()))?;

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => {
                tracing::warn!("Found {} {} records with id '{}'", n, T::KIND, id);
                Ok(None)
            }
        }
    }

    pub fn find_all_records(&self) -> Result<Vec<Record>, StoreError> {
        self.db.with_doc(T::KIND, |doc| {
            Ok(codec::read_all_records(doc)?
                .into_iter()
                .map(|(_, record)| record)
                .collect())
        })
    }

    /// Returns every decodable record of the collection. Undecodable records are logged and skipped.
    pub fn find_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self
            .find_all_records()?
            .iter()
            .filter_map(|record| decode_or_warn(record))
            .collect())
    }

    pub fn find_records_by_attribute(
        &self,
        name: &str,
        value: &FieldValue,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .find_all_records()?
            .into_iter()
            .filter(|record| record.get(name) == Some(value))
            .collect())
    }

    /// Returns all records whose field `name` equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &FieldValue) -> Result<Vec<T>, StoreError> {
        Ok(self
            .find_records_by_attribute(name, value)?
            .iter()
            .filter_map(|record| decode_or_warn(record))
            .collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.db
            .with_doc(T::KIND, |doc| Ok(codec::read_all_records(doc)?.len()))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Removes every record of the collection, returning how many were removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        self.db.with_doc_mut(T::KIND, |doc| {
            let keys: Vec<String> = codec::read_all_records(doc)?
                .into_iter()
                .map(|(key, _)| key)
                .collect();
            for key in &keys {
                codec::delete_record(doc, key)?;
            }
            Ok(keys.len())
        })
    }
}

fn decode_or_warn<T: Entity>(record: &Record) -> Option<T> {
    match T::from_record(record) {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!("Skipping invalid {} record: {}", T::KIND, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use crate::store::RecordError;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct Badge {
        id: Identifier,
        code: String,
        level: i64,
    }

    impl Badge {
        fn new(code: &str, level: i64) -> Self {
            Self {
                id: Identifier::new(),
                code: code.to_string(),
                level,
            }
        }
    }

    impl Entity for Badge {
        const KIND: EntityKind = EntityKind::MovementType;
        const KEY_FIELD: &'static str = "code";

        fn id(&self) -> &Identifier {
            &self.id
        }

        fn key(&self) -> String {
            self.code.clone()
        }

        fn to_record(&self) -> Record {
            Record::new()
                .with("id", &self.id)
                .with("code", self.code.as_str())
                .with("level", self.level)
        }

        fn from_record(record: &Record) -> Result<Self, RecordError> {
            Ok(Self {
                id: record.require_id("id")?,
                code: record.require_text("code")?,
                level: record.require_int("level")?,
            })
        }
    }

    fn test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().to_path_buf()).unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_insert_and_find_by_key() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        let badge = Badge::new("L", 1);
        badges.insert(&badge).unwrap();

        assert_eq!(badges.find_by_key("L").unwrap(), Some(badge));
        assert!(badges.find_by_key("X").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_key_fails() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        badges.insert(&Badge::new("L", 1)).unwrap();
        let err = badges.insert(&Badge::new("L", 2)).unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey(ref k) if k == "L"));
        assert_eq!(badges.len().unwrap(), 1);
        assert_eq!(badges.find_by_key("L").unwrap().unwrap().level, 1);
    }

    #[test]
    fn test_update_missing_fails() {
        let (db, _temp) = test_db();
        let err = db.collection::<Badge>().update(&Badge::new("L", 1)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_replaces_record() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        let mut badge = Badge::new("L", 1);
        badges.insert(&badge).unwrap();
        badge.level = 5;
        badges.update(&badge).unwrap();

        assert_eq!(badges.find_by_key("L").unwrap().unwrap().level, 5);
    }

    #[test]
    fn test_remove() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        let badge = Badge::new("L", 1);
        badges.insert(&badge).unwrap();
        badges.remove(&badge).unwrap();

        assert!(!badges.contains("L").unwrap());
        assert!(matches!(badges.remove(&badge), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_find_by_attribute() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        badges.insert(&Badge::new("A", 1)).unwrap();
        badges.insert(&Badge::new("B", 2)).unwrap();
        badges.insert(&Badge::new("C", 2)).unwrap();

        let level_two = badges.find_by_attribute("level", &FieldValue::Int(2)).unwrap();
        assert_eq!(level_two.len(), 2);
        assert!(badges
            .find_by_attribute("level", &FieldValue::Int(9))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_record_by_id() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        let badge = Badge::new("A", 1);
        badges.insert(&badge).unwrap();

        let record = badges.find_record_by_id(badge.id.as_str()).unwrap().unwrap();
        assert_eq!(record.text("code").as_deref(), Some("A"));
    }

    #[test]
    fn test_find_record_by_id_ambiguous_returns_none() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        let first = Badge::new("A", 1);
        let mut second = Badge::new("B", 1);
        second.id = first.id.clone();
        badges.insert(&first).unwrap();
        badges.insert(&second).unwrap();

        assert!(badges.find_record_by_id(first.id.as_str()).unwrap().is_none());
    }

    #[test]
    fn test_persists_across_handles() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = Database::open(temp_dir.path().to_path_buf()).unwrap();
            db.collection::<Badge>().insert(&Badge::new("L", 3)).unwrap();
        }

        let db = Database::open(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(
            db.collection::<Badge>().find_by_key("L").unwrap().unwrap().level,
            3
        );
        assert!(db.collection_exists(EntityKind::MovementType));
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let (mut db, _temp) = test_db();
        db.close();

        assert!(!db.is_open());
        let badges = db.collection::<Badge>();
        assert!(matches!(badges.insert(&Badge::new("L", 1)), Err(StoreError::Unavailable)));
        assert!(matches!(badges.find_all(), Err(StoreError::Unavailable)));
    }

    #[test]
    fn test_clear() {
        let (db, _temp) = test_db();
        let badges = db.collection::<Badge>();

        badges.insert(&Badge::new("A", 1)).unwrap();
        badges.insert(&Badge::new("B", 1)).unwrap();

        assert_eq!(badges.clear().unwrap(), 2);
        assert!(badges.is_empty().unwrap());
    }
}
