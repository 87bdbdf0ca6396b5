use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::track::Track;
use super::training_type::TrainingType;
use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// A performed training session.
///
/// The training type and track are associations: a training refers to them
/// but does not own them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Training {
    pub id: Identifier,
    pub date: DateTime<Utc>,
    pub name: String,
    pub remarks: String,
    pub training_type: TrainingType,
    pub track: Option<Track>,
    /// minutes
    pub duration: i64,
    /// km, when entered manually
    pub distance: Option<f64>,
}

impl Training {
    pub fn new(date: DateTime<Utc>, name: impl Into<String>, training_type: TrainingType) -> Self {
        Self {
            id: Identifier::new(),
            date,
            name: name.into(),
            remarks: String::new(),
            training_type,
            track: None,
            duration: 0,
            distance: None,
        }
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration = minutes;
        self
    }

    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance = Some(km);
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// Manually entered distance, else the track length.
    pub fn distance_km(&self) -> f64 {
        match (self.distance, &self.track) {
            (Some(km), _) => km,
            (None, Some(track)) => track.distance_meters() / 1000.0,
            (None, None) => 0.0,
        }
    }
}

impl fmt::Display for Training {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {} min, {:.2} km",
            self.date.format("%Y-%m-%d"),
            self.name,
            self.training_type,
            self.duration,
            self.distance_km()
        )
    }
}

impl Entity for Training {
    const KIND: EntityKind = EntityKind::Training;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("date", self.date.to_rfc3339())
            .with("name", self.name.as_str())
            .with("remarks", self.remarks.as_str())
            .with("training_type", self.training_type.name.as_str())
            .with("track_id", self.track.as_ref().map(|t| &t.id))
            .with("duration", self.duration)
            .with("distance", self.distance)
    }

    /// The training type is restored by name only and the track is left
    /// unset; both are resolved by the repository.
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            date: record.require_timestamp("date")?,
            name: record.text("name").unwrap_or_default(),
            remarks: record.text("remarks").unwrap_or_default(),
            training_type: TrainingType::new(record.require_text("training_type")?),
            track: None,
            duration: record.int("duration").unwrap_or(0),
            distance: record.float("distance"),
        })
    }
}
