use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A single recorded GPS point of a track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationData {
    pub id: Identifier,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// meters
    pub altitude: f64,
}

impl LocationData {
    pub fn new(time: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Identifier::new(),
            time,
            latitude,
            longitude,
            altitude: 0.0,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &LocationData) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl Entity for LocationData {
    const KIND: EntityKind = EntityKind::LocationData;

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("time", self.time.to_rfc3339())
            .with("latitude", self.latitude)
            .with("longitude", self.longitude)
            .with("altitude", self.altitude)
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            time: record.require_timestamp("time")?,
            latitude: record.require_float("latitude")?,
            longitude: record.require_float("longitude")?,
            altitude: record.float("altitude").unwrap_or(0.0),
        })
    }
}
