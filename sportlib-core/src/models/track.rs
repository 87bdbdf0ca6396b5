use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::location_data::LocationData;
use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// A recorded route. Owns its location points exclusively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: Identifier,
    pub name: String,
    pub locations: Vec<LocationData>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            locations: Vec::new(),
        }
    }

    pub fn with_locations(mut self, locations: Vec<LocationData>) -> Self {
        self.locations = locations;
        self
    }

    pub fn add_location(&mut self, location: LocationData) {
        self.locations.push(location);
    }

    /// Length of the track in meters.
    pub fn distance_meters(&self) -> f64 {
        self.locations
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Time between the first and last point.
    pub fn duration(&self) -> Duration {
        match (self.locations.first(), self.locations.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => Duration::zero(),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} points, {:.2} km)",
            self.name,
            self.locations.len(),
            self.distance_meters() / 1000.0
        )
    }
}

impl Entity for Track {
    const KIND: EntityKind = EntityKind::Track;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("name", self.name.as_str())
            .with_ids("location_ids", self.locations.iter().map(|l| &l.id))
    }

    /// Locations are left empty; they are resolved through `location_ids`.
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            name: record.text("name").unwrap_or_default(),
            locations: Vec::new(),
        })
    }
}
