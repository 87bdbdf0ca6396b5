use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// The person using the library. One user is expected per store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Identifier,
    pub name: String,
    pub birth_year: Option<i64>,
    pub max_pulse: Option<i64>,
    /// Plan the user is currently training with
    pub active_plan_id: Option<Identifier>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            birth_year: None,
            max_pulse: None,
            active_plan_id: None,
        }
    }

    pub fn with_birth_year(mut self, year: i64) -> Self {
        self.birth_year = Some(year);
        self
    }

    pub fn with_max_pulse(mut self, pulse: i64) -> Self {
        self.max_pulse = Some(pulse);
        self
    }

    pub fn with_active_plan(mut self, plan_id: Identifier) -> Self {
        self.active_plan_id = Some(plan_id);
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(year) = self.birth_year {
            write!(f, " (born {})", year)?;
        }
        Ok(())
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

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
            .with("birth_year", self.birth_year)
            .with("max_pulse", self.max_pulse)
            .with("active_plan_id", self.active_plan_id.as_ref())
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            name: record.text("name").unwrap_or_default(),
            birth_year: record.int("birth_year"),
            max_pulse: record.int("max_pulse"),
            active_plan_id: record.id("active_plan_id"),
        })
    }
}
