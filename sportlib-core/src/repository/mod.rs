//! Cascading persistence of composite domain objects.
//!
//! The store only knows flat records. The repository decomposes object graphs
//! into records on write and reassembles them on read, following the
//! ownership rules of each type:
//!
//! ```text
//! RunningPlan ──owns──> RunningPlanEntry ──owns──> RunningUnit ──refers──> MovementType
//! Track       ──owns──> LocationData
//! Training    ──refers─> TrainingType, Track
//! User        ──refers─> RunningPlan (active plan)
//! ```
//!
//! Owned children are written and removed together with their root. Referenced
//! entities are shared reference data: they are inserted when missing but never
//! overwritten or removed by a cascade.
//!
//! A cascade is a sequence of independent store writes. A failure in the middle
//! leaves the earlier writes in place.

mod cascade;
mod error;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub use cascade::Cascade;
pub use error::{Action, RepositoryError};

use crate::identifier::Identifier;
use crate::models::{
    LocationData, MovementType, RunningPlan, RunningPlanEntry, RunningUnit, Track, Training,
    TrainingType, User,
};
use crate::store::{Database, Entity, EntityKind, FieldValue, Record};

/// Runs `$body` with `$c` bound to the collection of `$kind`.
macro_rules! with_collection {
    ($db:expr, $kind:expr, $c:ident => $body:expr) => {
        match $kind {
            EntityKind::MovementType => {
                let $c = $db.collection::<MovementType>();
                $body
            }
            EntityKind::TrainingType => {
                let $c = $db.collection::<TrainingType>();
                $body
            }
            EntityKind::User => {
                let $c = $db.collection::<User>();
                $body
            }
            EntityKind::RunningUnit => {
                let $c = $db.collection::<RunningUnit>();
                $body
            }
            EntityKind::RunningPlanEntry => {
                let $c = $db.collection::<RunningPlanEntry>();
                $body
            }
            EntityKind::RunningPlan => {
                let $c = $db.collection::<RunningPlan>();
                $body
            }
            EntityKind::LocationData => {
                let $c = $db.collection::<LocationData>();
                $body
            }
            EntityKind::Track => {
                let $c = $db.collection::<Track>();
                $body
            }
            EntityKind::Training => {
                let $c = $db.collection::<Training>();
                $body
            }
        }
    };
}

/// Cascade orchestrator over a [`Database`].
///
/// Mutating operations fail with [`RepositoryError::StoreUnavailable`] once
/// the store is closed; lookups log a warning and return nothing instead.
pub struct Repository {
    db: Database,
}

impl Repository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the store in `data_dir` and wraps it.
    pub fn open(data_dir: PathBuf) -> Result<Self, RepositoryError> {
        let db = Database::open(data_dir).map_err(RepositoryError::Open)?;
        Ok(Self::new(db))
    }

    pub fn is_open(&self) -> bool {
        self.db.is_open()
    }

    pub fn close(&mut self) {
        self.db.close();
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Inserts `entity` with its graph, or updates it if its key is already stored.
    ///
    /// Calling `add` twice with the same object is equivalent to `add`
    /// followed by `update`.
    pub fn add<T: Cascade>(&self, entity: &T) -> Result<(), RepositoryError> {
        self.ensure_open()?;

        match self.stored_record::<T>(&entity.key())? {
            Some(stored) => {
                tracing::debug!("{} '{}' already stored, updating", T::KIND, entity.key());
                entity.update_graph(self, &stored)
            }
            None => {
                tracing::debug!("Inserting {} '{}'", T::KIND, entity.key());
                entity.insert_graph(self)
            }
        }
    }

    /// Updates a stored `entity` with its graph.
    ///
    /// The root must exist. Children that are missing from the store are
    /// inserted; children the stored root owned but `entity` no longer contains
    /// are removed.
    pub fn update<T: Cascade>(&self, entity: &T) -> Result<(), RepositoryError> {
        self.ensure_open()?;

        let stored = self
            .stored_record::<T>(&entity.key())?
            .ok_or_else(|| RepositoryError::NotFound {
                kind: T::KIND,
                key: entity.key(),
            })?;
        tracing::debug!("Updating {} '{}'", T::KIND, entity.key());
        entity.update_graph(self, &stored)
    }

    /// Removes `entity` and every child it exclusively owns.
    ///
    /// Children are taken from the stored record, not from `entity`.
    /// Referenced entities are never removed.
    pub fn delete<T: Cascade>(&self, entity: &T) -> Result<(), RepositoryError> {
        self.ensure_open()?;

        let stored = self
            .stored_record::<T>(&entity.key())?
            .ok_or_else(|| RepositoryError::NotFound {
                kind: T::KIND,
                key: entity.key(),
            })?;
        tracing::debug!("Deleting {} '{}'", T::KIND, entity.key());
        T::remove_graph(self, &stored)
    }

    /// Returns the entity stored under `key`, with its references resolved.
    pub fn find_by_key<T: Cascade>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        if !self.available_for_lookup() {
            return Ok(None);
        }

        match self.stored_record::<T>(key)? {
            Some(record) => Ok(Some(T::load(self, &record)?)),
            None => Ok(None),
        }
    }

    /// Looks an entity up by identifier, also for kinds keyed on a business field.
    ///
    /// Several records sharing the identifier is an integrity problem; it is
    /// logged and nothing is returned.
    pub fn find_by_id<T: Cascade>(&self, id: &Identifier) -> Result<Option<T>, RepositoryError> {
        if T::KEY_FIELD == "id" {
            return self.find_by_key(id.as_str());
        }
        if !self.available_for_lookup() {
            return Ok(None);
        }

        let record = self
            .db
            .collection::<T>()
            .find_record_by_id(id.as_str())
            .map_err(|e| RepositoryError::from_store(Action::Load, T::KIND, id.as_str(), e))?;
        match record {
            Some(record) => Ok(Some(T::load(self, &record)?)),
            None => Ok(None),
        }
    }

    /// Returns every entity of type `T`. Entities that fail to load are logged and skipped.
    pub fn find_all<T: Cascade>(&self) -> Result<Vec<T>, RepositoryError> {
        if !self.available_for_lookup() {
            return Ok(Vec::new());
        }

        let records = self
            .db
            .collection::<T>()
            .find_all_records()
            .map_err(|e| RepositoryError::from_store(Action::Load, T::KIND, "*", e))?;
        Ok(self.load_all(&records))
    }

    /// Returns every entity of type `T` whose stored field `name` equals `value`.
    pub fn find_by_attribute<T: Cascade>(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<T>, RepositoryError> {
        if !self.available_for_lookup() {
            return Ok(Vec::new());
        }

        let records = self
            .db
            .collection::<T>()
            .find_records_by_attribute(name, &value.into())
            .map_err(|e| RepositoryError::from_store(Action::Load, T::KIND, name, e))?;
        Ok(self.load_all(&records))
    }

    /// Returns the library's user. More than one stored user is logged.
    pub fn user(&self) -> Result<Option<User>, RepositoryError> {
        let mut users = self.find_all::<User>()?;
        if users.len() > 1 {
            tracing::warn!("Found {} users, expected one", users.len());
            users.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Ok(users.into_iter().next())
    }

    /// Number of stored records of the kind named `kind_name`.
    pub fn count(&self, kind_name: &str) -> Result<usize, RepositoryError> {
        let kind: EntityKind = kind_name.parse()?;
        self.count_kind(kind)
    }

    pub fn count_kind(&self, kind: EntityKind) -> Result<usize, RepositoryError> {
        if !self.available_for_lookup() {
            return Ok(0);
        }
        with_collection!(self.db, kind, c => c.len())
            .map_err(|e| RepositoryError::from_store(Action::Load, kind, "*", e))
    }

    /// Removes every record of the kind named `kind_name` without cascading.
    pub fn clear_kind(&self, kind_name: &str) -> Result<usize, RepositoryError> {
        let kind: EntityKind = kind_name.parse()?;
        self.ensure_open()?;
        with_collection!(self.db, kind, c => c.clear())
            .map_err(|e| RepositoryError::from_store(Action::Remove, kind, "*", e))
    }

    /// Removes every record of every kind. Failures are logged and skipped.
    pub fn clear_all(&self) {
        for kind in EntityKind::ALL {
            match with_collection!(self.db, kind, c => c.clear()) {
                Ok(removed) => tracing::debug!("Cleared {} {} records", removed, kind),
                Err(e) => tracing::warn!("Failed to clear {} records: {}", kind, e),
            }
        }
    }

    fn ensure_open(&self) -> Result<(), RepositoryError> {
        if self.db.is_open() {
            Ok(())
        } else {
            Err(RepositoryError::StoreUnavailable)
        }
    }

    fn available_for_lookup(&self) -> bool {
        if !self.db.is_open() {
            tracing::warn!("Lookup on a closed store");
        }
        self.db.is_open()
    }

    fn load_all<T: Cascade>(&self, records: &[Record]) -> Vec<T> {
        records
            .iter()
            .filter_map(|record| match T::load(self, record) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!("Skipping {} record: {}", T::KIND, e);
                    None
                }
            })
            .collect()
    }

    // Single-record steps used by the cascades.

    pub(crate) fn stored_record<T: Entity>(&self, key: &str) -> Result<Option<Record>, RepositoryError> {
        self.db
            .collection::<T>()
            .find_record(key)
            .map_err(|e| RepositoryError::from_store(Action::Load, T::KIND, key, e))
    }

    pub(crate) fn exists<T: Entity>(&self, entity: &T) -> Result<bool, RepositoryError> {
        let key = entity.key();
        self.db
            .collection::<T>()
            .contains(&key)
            .map_err(|e| RepositoryError::from_store(Action::Load, T::KIND, &key, e))
    }

    pub(crate) fn insert_one<T: Entity>(&self, entity: &T) -> Result<(), RepositoryError> {
        self.db
            .collection::<T>()
            .insert(entity)
            .map_err(|e| RepositoryError::from_store(Action::Insert, T::KIND, entity.id().as_str(), e))
    }

    pub(crate) fn update_one<T: Entity>(&self, entity: &T) -> Result<(), RepositoryError> {
        self.db
            .collection::<T>()
            .update(entity)
            .map_err(|e| RepositoryError::from_store(Action::Update, T::KIND, entity.id().as_str(), e))
    }

    pub(crate) fn remove_key<T: Entity>(&self, key: &str) -> Result<(), RepositoryError> {
        self.db
            .collection::<T>()
            .remove_key(key)
            .map_err(|e| RepositoryError::from_store(Action::Remove, T::KIND, key, e))
    }

    /// Inserts `entity` with its graph unless its key is already stored.
    /// Returns whether it was inserted.
    pub(crate) fn insert_if_absent<T: Cascade>(&self, entity: &T) -> Result<bool, RepositoryError> {
        if self.exists(entity)? {
            return Ok(false);
        }
        tracing::debug!("Inserting missing {} '{}'", T::KIND, entity.key());
        entity.insert_graph(self)?;
        Ok(true)
    }

    /// Inserts or replaces the single record of `entity`, without touching its graph.
    pub(crate) fn upsert_one<T: Entity>(&self, entity: &T) -> Result<(), RepositoryError> {
        if self.exists(entity)? {
            self.update_one(entity)
        } else {
            self.insert_one(entity)
        }
    }

    /// Removes the single record under `key`, if stored. Its children are left alone.
    pub(crate) fn remove_record_if_present<T: Entity>(&self, key: &str) -> Result<bool, RepositoryError> {
        if self.stored_record::<T>(key)?.is_none() {
            return Ok(false);
        }
        self.remove_key::<T>(key)?;
        Ok(true)
    }

    /// Maps every child id listed in the `field` of a stored `P` to that parent's id.
    pub(crate) fn child_owners<P: Entity>(
        &self,
        field: &str,
    ) -> Result<HashMap<Identifier, Identifier>, RepositoryError> {
        let parents = self
            .db
            .collection::<P>()
            .find_all_records()
            .map_err(|e| RepositoryError::from_store(Action::Load, P::KIND, "*", e))?;

        let mut owners = HashMap::new();
        for parent in &parents {
            let Some(parent_id) = parent.id("id") else {
                continue;
            };
            for child_id in parent.ids(field) {
                owners.insert(child_id, parent_id.clone());
            }
        }
        Ok(owners)
    }

    /// Removes the record under `key` with its graph, if stored.
    pub(crate) fn remove_if_present<T: Cascade>(&self, key: &str) -> Result<bool, RepositoryError> {
        match self.stored_record::<T>(key)? {
            Some(stored) => {
                T::remove_graph(self, &stored)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the children listed in `stored` that are not in `current`.
    pub(crate) fn prune_orphans<'a, C: Cascade>(
        &self,
        stored: &[Identifier],
        current: impl IntoIterator<Item = &'a Identifier>,
    ) -> Result<(), RepositoryError> {
        let current: HashSet<&Identifier> = current.into_iter().collect();
        for id in stored.iter().filter(|id| !current.contains(id)) {
            if self.remove_if_present::<C>(id.as_str())? {
                tracing::debug!("Removed orphaned {} '{}'", C::KIND, id);
            }
        }
        Ok(())
    }

    /// Loads the children listed by a parent. Missing children are logged and skipped.
    pub(crate) fn resolve_children<C: Cascade>(
        &self,
        parent_kind: EntityKind,
        parent_id: &Identifier,
        ids: &[Identifier],
    ) -> Result<Vec<C>, RepositoryError> {
        let mut children = Vec::with_capacity(ids.len());
        for id in ids {
            match self.stored_record::<C>(id.as_str())? {
                Some(record) => children.push(C::load(self, &record)?),
                None => tracing::warn!(
                    "{} '{}' references missing {} '{}'",
                    parent_kind,
                    parent_id,
                    C::KIND,
                    id
                ),
            }
        }
        Ok(children)
    }
}
