//! rowkeep store - SQLite persistence for `Record` types
//!
//! Provides:
//! - `Database`/`Store`: open a connection, `put` (upsert with
//!   create-on-first-write) and `get` by primary key
//! - Per-store metadata cache keyed by record type
//! - Connection configuration (`StoreConfig`) and helpers in `db`
//! - Translation of SQLite failures into the structured error facility

pub mod config;
pub mod db;
pub mod errors;
pub mod store;

// Re-export key types
pub use config::{JournalMode, StoreConfig};
pub use errors::Result;
pub use store::{Database, Store};
