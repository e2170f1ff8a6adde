//! rowkeep core - record model and statement derivation
//!
//! This crate holds everything that does not touch a database connection:
//! - Record contract (`Record`, `FieldDef`, `Value`) and the `record!` macro
//! - Namespaced per-field metadata with the primary-key marker
//! - Metadata deriver producing table names and CREATE/UPSERT/SELECT templates
//! - Structured error facility and logging facility shared with the store

pub mod deriver;
pub mod errors;
pub mod logging_facility;
pub mod model;

pub use rowkeep_core_types::schema;

// Re-export commonly used types
pub use deriver::{flatten_type_name, query_template, TableMetadata};
pub use errors::{Result, RkError, RkErrorKind, RowkeepError};
pub use model::{primary_key, FieldDef, FieldMetadata, FromValue, Record, RowReader, Value};
