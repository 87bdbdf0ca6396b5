use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// A kind of movement inside a running unit (running, walking, ...).
///
/// Movement types are shared reference data: they are identified by their
/// short `key` ("L", "G") and never deleted together with the plans that use
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementType {
    pub id: Identifier,
    pub key: String,
    pub color: String,
    /// km/h
    pub speed: f64,
    /// minutes per km
    pub pace: f64,
}

impl MovementType {
    pub fn new(key: impl Into<String>, color: impl Into<String>, speed: f64) -> Self {
        Self {
            id: Identifier::new(),
            key: key.into(),
            color: color.into(),
            speed,
            pace: pace_for_speed(speed),
        }
    }

    /// A bare movement type known only by its key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self::new(key, "gray", 0.0)
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self.pace = pace_for_speed(speed);
        self
    }

    /// Distance in km covered in `minutes` at this movement type's speed.
    pub fn distance_for(&self, minutes: i64) -> f64 {
        self.speed * minutes as f64 / 60.0
    }
}

fn pace_for_speed(speed: f64) -> f64 {
    if speed > 0.0 {
        60.0 / speed
    } else {
        0.0
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} km/h, {:.2} min/km)", self.key, self.speed, self.pace)
    }
}

impl Entity for MovementType {
    const KIND: EntityKind = EntityKind::MovementType;
    const KEY_FIELD: &'static str = "key";

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.key.clone()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("key", self.key.as_str())
            .with("color", self.color.as_str())
            .with("speed", self.speed)
            .with("pace", self.pace)
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            key: record.require_text("key")?,
            color: record.text("color").unwrap_or_default(),
            speed: record.float("speed").unwrap_or(0.0),
            pace: record.float("pace").unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_pace() {
        let run = MovementType::new("L", "green", 10.0);
        assert_eq!(run.key, "L");
        assert!((run.pace - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_speed_has_zero_pace() {
        let mt = MovementType::with_key("Y");
        assert_eq!(mt.speed, 0.0);
        assert_eq!(mt.pace, 0.0);
    }

    #[test]
    fn test_distance_for() {
        let run = MovementType::new("L", "green", 12.0);
        assert!((run.distance_for(30) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_key_is_business_key() {
        let run = MovementType::new("L", "green", 10.0);
        assert_eq!(Entity::key(&run), "L");
        assert_eq!(run.to_record().text(MovementType::KEY_FIELD).as_deref(), Some("L"));
    }

    #[test]
    fn test_record_roundtrip() {
        let walk = MovementType::new("G", "blue", 5.0);
        let parsed = MovementType::from_record(&walk.to_record()).unwrap();
        assert_eq!(parsed, walk);
    }
}
