//! Embedded document store.
//!
//! Each entity kind lives in its own Automerge document
//! (`<data_dir>/<collection>.automerge`). Inside a document every record is a
//! flat map stored under its unique key:
//!
//! ```text
//! running_units.automerge
//! └── "<unit-id>" -> { id, duration, movement_type: "L", completed, ... }
//! movement_types.automerge
//! └── "L"         -> { id, key: "L", color, speed, pace }
//! ```
//!
//! References between records are plain identifier strings; the store knows
//! nothing about them. Cascading is done by [`crate::repository`].

mod codec;
mod database;
mod error;
mod kind;
mod record;
mod storage;

pub use database::{Collection, Database};
pub use error::StoreError;
pub use kind::{EntityKind, UnknownKind};
pub use record::{Entity, FieldValue, Record, RecordError};
pub use storage::DocumentStorage;
