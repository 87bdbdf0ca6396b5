use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::Identifier;
use crate::store::{Entity, EntityKind, Record, RecordError};

/// Category of a training (running, cycling, ...). Keyed by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingType {
    pub id: Identifier,
    pub name: String,
    pub remarks: String,
    pub icon: Option<String>,
}

impl TrainingType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            remarks: String::new(),
            icon: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Entity for TrainingType {
    const KIND: EntityKind = EntityKind::TrainingType;
    const KEY_FIELD: &'static str = "name";

    fn id(&self) -> &Identifier {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("name", self.name.as_str())
            .with("remarks", self.remarks.as_str())
            .with("icon", self.icon.clone())
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.require_id("id")?,
            name: record.require_text("name")?,
            remarks: record.text("remarks").unwrap_or_default(),
            icon: record.text("icon"),
        })
    }
}
