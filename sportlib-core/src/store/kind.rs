//! Entity kind enumeration for document storage.

use std::fmt;
use std::str::FromStr;

/// Every persisted entity type. Each kind is stored in its own document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    MovementType,
    TrainingType,
    User,
    RunningUnit,
    RunningPlanEntry,
    RunningPlan,
    LocationData,
    Track,
    Training,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::MovementType,
        EntityKind::TrainingType,
        EntityKind::User,
        EntityKind::RunningUnit,
        EntityKind::RunningPlanEntry,
        EntityKind::RunningPlan,
        EntityKind::LocationData,
        EntityKind::Track,
        EntityKind::Training,
    ];

    /// Returns the collection name for this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::MovementType => "movement_types",
            EntityKind::TrainingType => "training_types",
            EntityKind::User => "users",
            EntityKind::RunningUnit => "running_units",
            EntityKind::RunningPlanEntry => "running_plan_entries",
            EntityKind::RunningPlan => "running_plans",
            EntityKind::LocationData => "location_data",
            EntityKind::Track => "tracks",
            EntityKind::Training => "trainings",
        }
    }

    /// Returns the filename of the document holding this collection.
    pub fn filename(&self) -> String {
        format!("{}.automerge", self.collection())
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::MovementType => "MovementType",
            EntityKind::TrainingType => "TrainingType",
            EntityKind::User => "User",
            EntityKind::RunningUnit => "RunningUnit",
            EntityKind::RunningPlanEntry => "RunningPlanEntry",
            EntityKind::RunningPlan => "RunningPlan",
            EntityKind::LocationData => "LocationData",
            EntityKind::Track => "Track",
            EntityKind::Training => "Training",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Raised when a kind name does not match any registered entity type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported entity type '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    /// Accepts the type name ("RunningPlan") or the collection name
    /// ("running_plans"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_lowercase() == wanted || kind.collection() == wanted)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
