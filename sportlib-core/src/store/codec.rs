//! Conversion between [`Record`]s and Automerge document structure.
//!
//! A collection document stores each record at `root[key]` as a map. Scalar
//! fields map to Automerge scalars; identifier lists map to Automerge lists.

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};

use super::record::{FieldValue, Record};
use super::StoreError;

fn am_err(e: automerge::AutomergeError) -> StoreError {
    StoreError::Automerge(e.to_string())
}

/// Writes a record to the document at `root[key]`, replacing any previous record.
pub fn write_record(doc: &mut AutoCommit, key: &str, record: &Record) -> Result<(), StoreError> {
    let obj = doc.put_object(ROOT, key, ObjType::Map).map_err(am_err)?;

    for (field, value) in record.fields() {
        match value {
            FieldValue::Null => doc.put(&obj, field, ScalarValue::Null),
            FieldValue::Bool(b) => doc.put(&obj, field, *b),
            FieldValue::Int(i) => doc.put(&obj, field, *i),
            FieldValue::Float(f) => doc.put(&obj, field, *f),
            FieldValue::Text(s) => doc.put(&obj, field, s.as_str()),
            FieldValue::List(items) => {
                let list = doc.put_object(&obj, field, ObjType::List).map_err(am_err)?;
                for (i, item) in items.iter().enumerate() {
                    doc.insert(&list, i, item.as_str()).map_err(am_err)?;
                }
                Ok(())
            }
        }
        .map_err(am_err)?;
    }

    Ok(())
}

/// Deletes the record stored at `root[key]`. Returns whether it existed.
pub fn delete_record(doc: &mut AutoCommit, key: &str) -> Result<bool, StoreError> {
    if !contains_key(doc, key)? {
        return Ok(false);
    }
    doc.delete(ROOT, key).map_err(am_err)?;
    Ok(true)
}

pub fn contains_key(doc: &AutoCommit, key: &str) -> Result<bool, StoreError> {
    Ok(doc.get(ROOT, key).map_err(am_err)?.is_some())
}

/// Reads a single record by key.
pub fn read_record(doc: &AutoCommit, key: &str) -> Result<Option<Record>, StoreError> {
    match doc.get(ROOT, key).map_err(am_err)? {
        Some((Value::Object(ObjType::Map), obj_id)) => read_map(doc, &obj_id).map(Some),
        _ => Ok(None),
    }
}

/// Reads all records of a document as `(key, record)` pairs.
pub fn read_all_records(doc: &AutoCommit) -> Result<Vec<(String, Record)>, StoreError> {
    let mut records = Vec::new();

    for key in doc.keys(ROOT) {
        if let Some(record) = read_record(doc, &key)? {
            records.push((key, record));
        }
    }

    Ok(records)
}

fn read_map(doc: &AutoCommit, obj_id: &ObjId) -> Result<Record, StoreError> {
    let mut record = Record::new();

    for field in doc.keys(obj_id) {
        let Some((value, child)) = doc.get(obj_id, &field).map_err(am_err)? else {
            continue;
        };

        let value = match value {
            Value::Object(ObjType::List) => FieldValue::List(read_string_list(doc, &child)?),
            // Nested maps are not part of the record format
            Value::Object(_) => continue,
            Value::Scalar(scalar) => match scalar.as_ref() {
                ScalarValue::Str(s) => FieldValue::Text(s.to_string()),
                ScalarValue::Int(i) => FieldValue::Int(*i),
                ScalarValue::Uint(u) => FieldValue::Int(*u as i64),
                ScalarValue::F64(f) => FieldValue::Float(*f),
                ScalarValue::Boolean(b) => FieldValue::Bool(*b),
                ScalarValue::Null => FieldValue::Null,
                _ => continue,
            },
        };

        record.set(&field, value);
    }

    Ok(record)
}

fn read_string_list(doc: &AutoCommit, list_id: &ObjId) -> Result<Vec<String>, StoreError> {
    let mut result = Vec::new();

    let len = doc.length(list_id);
    for i in 0..len {
        if let Some((value, _)) = doc.get(list_id, i).map_err(am_err)? {
            if let Ok(s) = value.into_string() {
                result.push(s);
            }
        }
    }

    Ok(result)
}
