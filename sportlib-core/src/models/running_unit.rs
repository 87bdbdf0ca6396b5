use serde::{Deserialize, Serialize};
use std::fmt;

use super::movement_type::MovementType;
use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// One block of a training day, e.g. "5 minutes walking".
///
/// The movement type is stored as a reference to its key; units are owned by
/// exactly one [`super::RunningPlanEntry`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunningUnit {
    pub id: Identifier,
    /// minutes
    pub duration: i64,
    pub movement_type: MovementType,
    pub completed: bool,
    /// Heart rate range of imported flex units
    pub pulse_min: Option<i64>,
    pub pulse_max: Option<i64>,
    /// Target pace of imported flex units, minutes per km
    pub pace: Option<f64>,
}

impl RunningUnit {
    pub fn new(duration: i64, movement_type: MovementType) -> Self {
        Self {
            id: Identifier::new(),
            duration,
            movement_type,
            completed: false,
            pulse_min: None,
            pulse_max: None,
            pace: None,
        }
    }

    pub fn with_pulse_range(mut self, min: i64, max: i64) -> Self {
        self.pulse_min = Some(min.min(max));
        self.pulse_max = Some(min.max(max));
        self
    }

    pub fn with_pace(mut self, pace: f64) -> Self {
        self.pace = Some(pace);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Estimated distance in km, using the unit's own pace if set.
    pub fn distance(&self) -> f64 {
        match self.pace {
            Some(pace) if pace > 0.0 => self.duration as f64 / pace,
            _ => self.movement_type.distance_for(self.duration),
        }
    }
}

impl fmt::Display for RunningUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{}] {} min {}", mark, self.duration, self.movement_type.key)?;
        if let (Some(min), Some(max)) = (self.pulse_min, self.pulse_max) {
            write!(f, " (pulse {}-{})", min, max)?;
        }
        Ok(())
    }
}

impl Entity for RunningUnit {
    const KIND: EntityKind = EntityKind::RunningUnit;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("duration", self.duration)
            .with("movement_type", self.movement_type.key.as_str())
            .with("completed", self.completed)
            .with("pulse_min", self.pulse_min)
            .with("pulse_max", self.pulse_max)
            .with("pace", self.pace)
    }

    /// The movement type is restored with its key only.
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            duration: record.require_int("duration")?,
            movement_type: MovementType::with_key(record.require_text("movement_type")?),
            completed: record.bool("completed").unwrap_or(false),
            pulse_min: record.int("pulse_min"),
            pulse_max: record.int("pulse_max"),
            pace: record.float("pace"),
        })
    }
}
