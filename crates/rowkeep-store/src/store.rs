//! Record persistence over a single SQLite connection
//!
//! `Database` holds configuration and is the unopened state; `open` yields
//! a `Store` owning the connection and a fresh metadata cache; `close`
//! consumes the store. Dropping a `Store` releases the connection too, so
//! every exit path gives the connection back.

use crate::config::StoreConfig;
use crate::db;
use crate::errors::{from_rusqlite, Result};
use rowkeep_core::errors::RowkeepError;
use rowkeep_core::model::{Record, Value};
use rowkeep_core::{log_op_end, log_op_error, log_op_start, TableMetadata};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::any::TypeId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// An unopened database: where it lives and how to connect
#[derive(Debug, Clone, Default)]
pub struct Database {
    config: StoreConfig,
}

impl Database {
    /// Database at `path`, or in-memory when `path` is `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            config: StoreConfig {
                path,
                ..StoreConfig::default()
            },
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Connect and return an open store with an empty metadata cache
    pub fn open(&self) -> Result<Store> {
        log_op_start!("open", in_memory = self.config.is_in_memory());
        let start = Instant::now();

        let conn = db::connect(&self.config).map_err(|e| {
            log_op_error!(
                "open",
                e,
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!("open", duration_ms = start.elapsed().as_millis() as u64);

        Ok(Store {
            conn,
            metadata: HashMap::new(),
            tables: HashMap::new(),
        })
    }

    /// Run `f` against an open store, closing it afterwards
    ///
    /// The store is closed whether `f` succeeds or fails; an error from `f`
    /// takes precedence over an error from closing.
    pub fn scoped<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<T>,
    {
        let mut store = self.open()?;
        let result = f(&mut store);
        let closed = store.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

/// Table claimed by a record type within one store
#[derive(Debug, Clone)]
struct TableClaim {
    type_id: TypeId,
    type_name: String,
    table_name: String,
}

/// An open connection plus the per-type metadata cache
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    metadata: HashMap<TypeId, Arc<TableMetadata>>,
    // keyed by lowercased table name; SQLite identifiers ignore ASCII case
    tables: HashMap<String, TableClaim>,
}

impl Store {
    /// Cached metadata for `R`, deriving it on first use
    ///
    /// Rejects `R` if a different record type already maps to the same
    /// flattened table name in this store, comparing names without regard
    /// to ASCII case the way SQLite does.
    pub fn metadata_for<R: Record>(&mut self) -> Result<Arc<TableMetadata>> {
        let type_id = TypeId::of::<R>();
        if let Some(meta) = self.metadata.get(&type_id) {
            return Ok(Arc::clone(meta));
        }

        let meta = Arc::new(TableMetadata::of::<R>());
        let claim_key = meta.table_name.to_ascii_lowercase();
        if let Some(claim) = self.tables.get(&claim_key) {
            if claim.type_id != type_id {
                return Err(RowkeepError::TableNameCollision {
                    table: claim.table_name.clone(),
                    existing: claim.type_name.clone(),
                    record: meta.type_name.clone(),
                }
                .into());
            }
        }

        debug!(
            record = meta.type_name.as_str(),
            table = meta.table_name.as_str(),
            field_count = meta.field_count(),
            pk_count = meta.primary_key_count(),
            "derived table metadata"
        );
        self.tables.insert(
            claim_key,
            TableClaim {
                type_id,
                type_name: meta.type_name.clone(),
                table_name: meta.table_name.clone(),
            },
        );
        self.metadata.insert(type_id, Arc::clone(&meta));
        Ok(meta)
    }

    /// Insert `record`, or replace the row sharing its primary key
    ///
    /// The first write of a type into a fresh database fails with a missing
    /// table; the table is then created and the upsert retried once.
    pub fn put<R: Record>(&mut self, record: &R) -> Result<()> {
        let meta = self.metadata_for::<R>()?;
        let table = meta.table_name.as_str();
        log_op_start!("put", table = table);
        let start = Instant::now();

        self.put_impl(&meta, record).map_err(|e| {
            log_op_error!(
                "put",
                e,
                duration_ms = start.elapsed().as_millis() as u64,
                table = table
            );
            e
        })?;

        log_op_end!(
            "put",
            duration_ms = start.elapsed().as_millis() as u64,
            table = table
        );
        Ok(())
    }

    fn put_impl<R: Record>(&self, meta: &TableMetadata, record: &R) -> Result<()> {
        let values: Vec<SqlValue> = record.values().into_iter().map(to_sql).collect();
        if values.len() != meta.field_count() {
            return Err(RowkeepError::FieldCountMismatch {
                record: meta.type_name.clone(),
                expected: meta.field_count(),
                found: values.len(),
            }
            .into());
        }

        match self.upsert(meta, &values) {
            Err(err) if err.is_missing_table(&meta.table_name) => {
                debug!(
                    table = meta.table_name.as_str(),
                    "table missing, creating and retrying upsert"
                );
                self.create_table(meta)?;
                self.upsert(meta, &values)
            }
            other => other,
        }
    }

    fn upsert(&self, meta: &TableMetadata, values: &[SqlValue]) -> Result<()> {
        // first copy binds VALUES (...), second binds the SET clause
        let params = params_from_iter(values.iter().chain(values.iter()));
        self.conn
            .prepare_cached(&meta.query_upsert)
            .and_then(|mut stmt| stmt.execute(params))
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn create_table(&self, meta: &TableMetadata) -> Result<()> {
        log_op_start!("create_table", table = meta.table_name.as_str());
        let start = Instant::now();

        self.conn
            .execute(&meta.query_create, [])
            .map_err(from_rusqlite)
            .map_err(|e| {
                log_op_error!(
                    "create_table",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = meta.table_name.as_str()
                );
                e
            })?;

        log_op_end!(
            "create_table",
            duration_ms = start.elapsed().as_millis() as u64,
            table = meta.table_name.as_str()
        );
        Ok(())
    }

    /// Fetch the record of type `R` with the given primary-key values
    ///
    /// Values are matched positionally to the primary-key fields in
    /// declaration order. A missing row fails with `RkErrorKind::NoRows`.
    pub fn get<R: Record>(&mut self, primary_key: &[Value]) -> Result<R> {
        self.fetch::<R, _, _>("get", primary_key, |row| {
            row.map_or_else(|| Err(no_rows()), R::from_values)
        })
    }

    /// Like [`Store::get`], but a missing row is `Ok(None)`
    pub fn try_get<R: Record>(&mut self, primary_key: &[Value]) -> Result<Option<R>> {
        self.fetch::<R, _, _>("try_get", primary_key, |row| {
            row.map(R::from_values).transpose()
        })
    }

    /// Run the select for `R` under `op`, turning the optional row into `T`
    fn fetch<R, T, F>(&mut self, op: &'static str, primary_key: &[Value], finish: F) -> Result<T>
    where
        R: Record,
        F: FnOnce(Option<Vec<Value>>) -> Result<T>,
    {
        let meta = self.metadata_for::<R>()?;
        let table = meta.table_name.as_str();
        log_op_start!(op, table = table);
        let start = Instant::now();

        let result = self.select_impl(&meta, primary_key).and_then(finish);

        match result {
            Ok(value) => {
                log_op_end!(
                    op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = table
                );
                Ok(value)
            }
            Err(e) => {
                log_op_error!(
                    op,
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    table = table
                );
                Err(e)
            }
        }
    }

    fn select_impl(&self, meta: &TableMetadata, primary_key: &[Value]) -> Result<Option<Vec<Value>>> {
        if primary_key.len() != meta.primary_key_count() {
            return Err(RowkeepError::PrimaryKeyArityMismatch {
                record: meta.type_name.clone(),
                expected: meta.primary_key_count(),
                found: primary_key.len(),
            }
            .into());
        }

        let params: Vec<SqlValue> = primary_key.iter().cloned().map(to_sql).collect();
        let mut stmt = self
            .conn
            .prepare_cached(&meta.query_select)
            .map_err(from_rusqlite)?;
        stmt.query_row(params_from_iter(params.iter()), read_row)
            .optional()
            .map_err(from_rusqlite)
    }

    /// Number of record types with cached metadata
    pub fn cached_types(&self) -> usize {
        self.metadata.len()
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, reporting any error from the engine
    pub fn close(self) -> Result<()> {
        log_op_start!("close", cached_types = self.metadata.len());
        let start = Instant::now();

        self.conn.close().map_err(|(_conn, err)| {
            let e = from_rusqlite(err);
            log_op_error!(
                "close",
                e,
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!("close", duration_ms = start.elapsed().as_millis() as u64);
        Ok(())
    }
}

fn no_rows() -> rowkeep_core::RkError {
    from_rusqlite(rusqlite::Error::QueryReturnedNoRows)
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<Vec<Value>> {
    (0..row.as_ref().column_count())
        .map(|i| row.get::<_, SqlValue>(i).map(from_sql))
        .collect()
}

fn to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(v),
        Value::Real(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(v),
        SqlValue::Real(v) => Value::Real(v),
        SqlValue::Text(v) => Value::Text(v),
        SqlValue::Blob(v) => Value::Blob(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkeep_core::errors::RkErrorKind;
    use rowkeep_core::record;

    record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Note {
            #[primary_key]
            id: i64,
            body: String,
        }
    }

    #[test]
    fn test_metadata_cached_once_per_type() {
        let mut store = Database::in_memory().open().unwrap();
        let first = store.metadata_for::<Note>().unwrap();
        let second = store.metadata_for::<Note>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.cached_types(), 1);
    }

    #[test]
    fn test_cache_starts_empty_on_each_open() {
        let db = Database::in_memory();
        let mut store = db.open().unwrap();
        store.metadata_for::<Note>().unwrap();
        store.close().unwrap();

        let store = db.open().unwrap();
        assert_eq!(store.cached_types(), 0);
    }

    #[test]
    fn test_first_put_creates_table() {
        let mut store = Database::in_memory().open().unwrap();
        store
            .put(&Note {
                id: 1,
                body: "hello".to_string(),
            })
            .unwrap();

        let count: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'Note'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_upsert_binds_twice_field_count() {
        let mut store = Database::in_memory().open().unwrap();
        let note = Note {
            id: 7,
            body: "x".to_string(),
        };
        store.put(&note).unwrap();
        assert_eq!(store.get::<Note>(&[7.into()]).unwrap(), note);
    }

    #[test]
    fn test_get_missing_row_is_no_rows() {
        let mut store = Database::in_memory().open().unwrap();
        store
            .put(&Note {
                id: 1,
                body: "a".to_string(),
            })
            .unwrap();
        let err = store.get::<Note>(&[2.into()]).unwrap_err();
        assert_eq!(err.kind(), RkErrorKind::NoRows);
    }
}
