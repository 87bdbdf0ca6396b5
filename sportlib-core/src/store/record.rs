//! Flat field -> value records and the contract every persisted type fulfils.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::EntityKind;
use crate::identifier::Identifier;

/// Errors raised while decoding a record into a domain object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Missing field '{0}'")]
    MissingField(String),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// A single field value. Lists only ever hold identifier strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&Identifier> for FieldValue {
    fn from(value: &Identifier) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Flat representation of one persisted entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn with_ids<'a>(mut self, field: &str, ids: impl IntoIterator<Item = &'a Identifier>) -> Self {
        self.set(
            field,
            FieldValue::List(ids.into_iter().map(|id| id.to_string()).collect()),
        );
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field) {
            Some(FieldValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Integers are also accepted from float fields written by older records.
    pub fn int(&self, field: &str) -> Option<i64> {
        match self.fields.get(field) {
            Some(FieldValue::Int(i)) => Some(*i),
            Some(FieldValue::Float(f)) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(FieldValue::Float(f)) => Some(*f),
            Some(FieldValue::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        match self.fields.get(field) {
            Some(FieldValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Identifier list; an absent field reads as empty.
    pub fn ids(&self, field: &str) -> Vec<Identifier> {
        match self.fields.get(field) {
            Some(FieldValue::List(items)) => items.iter().map(Identifier::from_string).collect(),
            _ => Vec::new(),
        }
    }

    pub fn id(&self, field: &str) -> Option<Identifier> {
        self.text(field).map(Identifier::from)
    }

    pub fn require_text(&self, field: &str) -> Result<String, RecordError> {
        self.text(field)
            .ok_or_else(|| RecordError::MissingField(field.to_string()))
    }

    pub fn require_int(&self, field: &str) -> Result<i64, RecordError> {
        self.int(field)
            .ok_or_else(|| RecordError::MissingField(field.to_string()))
    }

    pub fn require_float(&self, field: &str) -> Result<f64, RecordError> {
        self.float(field)
            .ok_or_else(|| RecordError::MissingField(field.to_string()))
    }

    pub fn require_id(&self, field: &str) -> Result<Identifier, RecordError> {
        self.require_text(field).map(Identifier::from)
    }

    pub fn require_date(&self, field: &str) -> Result<NaiveDate, RecordError> {
        let raw = self.require_text(field)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| RecordError::InvalidField {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn require_timestamp(&self, field: &str) -> Result<DateTime<Utc>, RecordError> {
        let raw = self.require_text(field)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RecordError::InvalidField {
                field: field.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Capability contract of every persisted domain type.
///
/// `KEY_FIELD` names the field whose value is the unique key of the record in
/// its collection. Most kinds key on `id`; reference data keys on a business
/// field instead.
pub trait Entity: Sized {
    const KIND: EntityKind;
    const KEY_FIELD: &'static str = "id";

    fn id(&self) -> &Identifier;

    fn to_record(&self) -> Record;

    /// Decodes the entity's own fields. References to other entities are
    /// left unresolved; see [`crate::repository::Cascade::load`].
    fn from_record(record: &Record) -> Result<Self, RecordError>;

    /// Value of the key field.
    fn key(&self) -> String {
        self.to_record()
            .text(Self::KEY_FIELD)
            .unwrap_or_else(|| self.id().to_string())
    }
}
