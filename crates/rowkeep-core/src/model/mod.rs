//! Record model: values, field metadata and the record contract

pub mod metadata;
pub mod record;
pub mod value;

pub use metadata::{primary_key, FieldMetadata, METADATA_NAMESPACE, PRIMARY_KEY};
pub use record::{FieldDef, Record, RowReader};
pub use value::{FromValue, Value};
