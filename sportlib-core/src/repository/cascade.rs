//! Per-type cascade policies.

use std::collections::{HashMap, HashSet};

use super::{Repository, RepositoryError};
use crate::identifier::Identifier;
use crate::models::{
    LocationData, MovementType, RunningPlan, RunningPlanEntry, RunningUnit, Track, Training,
    TrainingType, User,
};
use crate::store::{Entity, EntityKind, Record};

/// How an entity type is written, removed and reassembled as a graph.
///
/// The defaults treat the type as a plain record with no children. Composite
/// roots override them.
pub trait Cascade: Entity {
    /// Writes a root that is not stored yet, together with its children.
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        repo.insert_one(self)
    }

    /// Writes a root that is already stored as `stored`, together with its children.
    fn update_graph(&self, repo: &Repository, _stored: &Record) -> Result<(), RepositoryError> {
        repo.update_one(self)
    }

    /// Removes the stored root and the children listed in its record.
    fn remove_graph(repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        repo.remove_key::<Self>(&stored_key::<Self>(stored)?)
    }

    /// Decodes a stored record and resolves its references.
    fn load(_repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        decode(record)
    }
}

fn decode<T: Entity>(record: &Record) -> Result<T, RepositoryError> {
    T::from_record(record).map_err(|source| RepositoryError::Record {
        kind: T::KIND,
        source,
    })
}

fn stored_key<T: Entity>(record: &Record) -> Result<String, RepositoryError> {
    record
        .require_text(T::KEY_FIELD)
        .map_err(|source| RepositoryError::Record {
            kind: T::KIND,
            source,
        })
}

impl Cascade for MovementType {}

impl Cascade for TrainingType {}

impl Cascade for LocationData {}

impl Cascade for User {
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        let existing = repo.count_kind(EntityKind::User)?;
        if existing > 0 {
            tracing::warn!(
                "Adding user '{}' while {} user(s) already exist",
                self.name,
                existing
            );
        }
        repo.insert_one(self)
    }
}

impl Cascade for RunningUnit {
    fn load(repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        let mut unit: RunningUnit = decode(record)?;
        match repo.stored_record::<MovementType>(&unit.movement_type.key)? {
            Some(stored) => unit.movement_type = decode(&stored)?,
            None => tracing::warn!(
                "RunningUnit '{}' references missing MovementType '{}'",
                unit.id,
                unit.movement_type.key
            ),
        }
        Ok(unit)
    }
}

/// Fails with `DuplicateKey` when `child` is already listed by a parent outside `allowed`.
fn ensure_unclaimed<C: Entity>(
    owners: &HashMap<Identifier, Identifier>,
    child: &Identifier,
    allowed: &HashSet<&Identifier>,
) -> Result<(), RepositoryError> {
    match owners.get(child) {
        Some(owner) if !allowed.contains(owner) => {
            tracing::warn!("{} '{}' already belongs to '{}'", C::KIND, child, owner);
            Err(RepositoryError::DuplicateKey {
                kind: C::KIND,
                key: child.to_string(),
            })
        }
        _ => Ok(()),
    }
}

impl RunningPlanEntry {
    /// Rejects units that another entry outside `allowed` already owns.
    fn check_units(
        &self,
        unit_owners: &HashMap<Identifier, Identifier>,
        allowed: &HashSet<&Identifier>,
    ) -> Result<(), RepositoryError> {
        for unit in &self.units {
            ensure_unclaimed::<RunningUnit>(unit_owners, &unit.id, allowed)?;
        }
        Ok(())
    }

    /// Writes the units, their missing movement types and the entry record.
    fn write(&self, repo: &Repository) -> Result<(), RepositoryError> {
        for unit in &self.units {
            repo.insert_if_absent(&unit.movement_type)?;
            repo.add(unit)?;
        }
        repo.upsert_one(self)
    }
}

impl Cascade for RunningPlanEntry {
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        let unit_owners = repo.child_owners::<RunningPlanEntry>("unit_ids")?;
        self.check_units(&unit_owners, &HashSet::from([&self.id]))?;
        self.write(repo)
    }

    fn update_graph(&self, repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        let unit_owners = repo.child_owners::<RunningPlanEntry>("unit_ids")?;
        self.check_units(&unit_owners, &HashSet::from([&self.id]))?;
        self.write(repo)?;
        repo.prune_orphans::<RunningUnit>(&stored.ids("unit_ids"), self.units.iter().map(|u| &u.id))
    }

    /// Units go with the entry; their movement types stay.
    fn remove_graph(repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        for unit_id in stored.ids("unit_ids") {
            repo.remove_if_present::<RunningUnit>(unit_id.as_str())?;
        }
        repo.remove_key::<Self>(&stored_key::<Self>(stored)?)
    }

    fn load(repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        let mut entry: RunningPlanEntry = decode(record)?;
        entry.units = repo.resolve_children(Self::KIND, &entry.id, &record.ids("unit_ids"))?;
        Ok(entry)
    }
}

impl RunningPlan {
    /// Checks ownership of the whole graph, then writes every entry.
    ///
    /// Units may move between entries of this plan, so they are checked
    /// against all entries the plan owns now or owned before.
    fn write_entries(
        &self,
        repo: &Repository,
        stored_entries: &[Identifier],
    ) -> Result<(), RepositoryError> {
        let entry_owners = repo.child_owners::<RunningPlan>("entry_ids")?;
        let unit_owners = repo.child_owners::<RunningPlanEntry>("unit_ids")?;
        let this_plan = HashSet::from([&self.id]);
        let plan_entries: HashSet<&Identifier> = self
            .entries
            .iter()
            .map(|e| &e.id)
            .chain(stored_entries)
            .collect();

        for entry in &self.entries {
            ensure_unclaimed::<RunningPlanEntry>(&entry_owners, &entry.id, &this_plan)?;
            entry.check_units(&unit_owners, &plan_entries)?;
        }
        for entry in &self.entries {
            entry.write(repo)?;
        }
        Ok(())
    }

    fn unit_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter().flat_map(|e| e.units.iter().map(|u| &u.id))
    }
}

impl Cascade for RunningPlan {
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        self.write_entries(repo, &[])?;
        repo.insert_one(self)
    }

    /// Units are pruned against the whole plan, not per entry.
    fn update_graph(&self, repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        let stored_entries = stored.ids("entry_ids");
        let mut stored_units = Vec::new();
        for entry_id in &stored_entries {
            if let Some(entry) = repo.stored_record::<RunningPlanEntry>(entry_id.as_str())? {
                stored_units.extend(entry.ids("unit_ids"));
            }
        }

        self.write_entries(repo, &stored_entries)?;
        repo.update_one(self)?;

        repo.prune_orphans::<RunningUnit>(&stored_units, self.unit_ids())?;
        let kept: HashSet<&Identifier> = self.entries.iter().map(|e| &e.id).collect();
        for entry_id in stored_entries.iter().filter(|id| !kept.contains(id)) {
            if repo.remove_record_if_present::<RunningPlanEntry>(entry_id.as_str())? {
                tracing::debug!("Removed orphaned {} '{}'", RunningPlanEntry::KIND, entry_id);
            }
        }
        Ok(())
    }

    fn remove_graph(repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        for entry_id in stored.ids("entry_ids") {
            repo.remove_if_present::<RunningPlanEntry>(entry_id.as_str())?;
        }
        repo.remove_key::<Self>(&stored_key::<Self>(stored)?)
    }

    fn load(repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        let mut plan: RunningPlan = decode(record)?;
        plan.entries = repo.resolve_children(Self::KIND, &plan.id, &record.ids("entry_ids"))?;
        plan.sort_entries();
        Ok(plan)
    }
}

impl Track {
    /// Rejects locations that another track already owns.
    fn check_locations(&self, repo: &Repository) -> Result<(), RepositoryError> {
        let owners = repo.child_owners::<Track>("location_ids")?;
        let this_track = HashSet::from([&self.id]);
        for location in &self.locations {
            ensure_unclaimed::<LocationData>(&owners, &location.id, &this_track)?;
        }
        Ok(())
    }
}

impl Cascade for Track {
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        self.check_locations(repo)?;
        for location in &self.locations {
            repo.add(location)?;
        }
        repo.insert_one(self)
    }

    fn update_graph(&self, repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        self.check_locations(repo)?;
        for location in &self.locations {
            repo.add(location)?;
        }
        repo.prune_orphans::<LocationData>(
            &stored.ids("location_ids"),
            self.locations.iter().map(|l| &l.id),
        )?;
        repo.update_one(self)
    }

    fn remove_graph(repo: &Repository, stored: &Record) -> Result<(), RepositoryError> {
        for location_id in stored.ids("location_ids") {
            repo.remove_if_present::<LocationData>(location_id.as_str())?;
        }
        repo.remove_key::<Self>(&stored_key::<Self>(stored)?)
    }

    fn load(repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        let mut track: Track = decode(record)?;
        track.locations =
            repo.resolve_children(Self::KIND, &track.id, &record.ids("location_ids"))?;
        Ok(track)
    }
}

impl Training {
    /// Stores the training type and track if they are new. Existing ones are
    /// left untouched.
    fn write_references(&self, repo: &Repository) -> Result<(), RepositoryError> {
        repo.insert_if_absent(&self.training_type)?;
        if let Some(track) = &self.track {
            repo.insert_if_absent(track)?;
        }
        Ok(())
    }
}

/// Removing a training leaves its training type and track in place.
impl Cascade for Training {
    fn insert_graph(&self, repo: &Repository) -> Result<(), RepositoryError> {
        self.write_references(repo)?;
        repo.insert_one(self)
    }

    fn update_graph(&self, repo: &Repository, _stored: &Record) -> Result<(), RepositoryError> {
        self.write_references(repo)?;
        repo.update_one(self)
    }

    fn load(repo: &Repository, record: &Record) -> Result<Self, RepositoryError> {
        let mut training: Training = decode(record)?;

        match repo.stored_record::<TrainingType>(&training.training_type.name)? {
            Some(stored) => training.training_type = decode(&stored)?,
            None => tracing::warn!(
                "Training '{}' references missing TrainingType '{}'",
                training.id,
                training.training_type.name
            ),
        }

        if let Some(track_id) = record.id("track_id") {
            match repo.stored_record::<Track>(track_id.as_str())? {
                Some(stored) => training.track = Some(Track::load(repo, &stored)?),
                None => tracing::warn!(
                    "Training '{}' references missing Track '{}'",
                    training.id,
                    track_id
                ),
            }
        }
        Ok(training)
    }
}
