//! Database connection management
//!
//! Provides utilities for opening and configuring SQLite connections

use crate::config::{JournalMode, StoreConfig};
use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Open and configure a connection as described by `config`
pub fn connect(config: &StoreConfig) -> Result<Connection> {
    let conn = match &config.path {
        Some(path) => open(path)?,
        None => open_in_memory()?,
    };
    configure(&conn, config)?;
    Ok(conn)
}

/// Apply connection pragmas from `config`
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    if let Some(timeout_ms) = config.busy_timeout_ms {
        conn.busy_timeout(Duration::from_millis(timeout_ms))
            .map_err(from_rusqlite)?;
    }

    // in-memory databases only support the "memory" journal
    if config.journal_mode == JournalMode::Wal && !config.is_in_memory() {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(from_rusqlite)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_mode(conn: &Connection) -> String {
        conn.pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_wal_applied_to_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file(dir.path().join("wal.db")).with_journal_mode(JournalMode::Wal);
        let conn = connect(&config).unwrap();
        assert_eq!(journal_mode(&conn).to_lowercase(), "wal");
    }

    #[test]
    fn test_wal_skipped_in_memory() {
        let config = StoreConfig::in_memory().with_journal_mode(JournalMode::Wal);
        let conn = connect(&config).unwrap();
        assert_eq!(journal_mode(&conn), "memory");
    }

    #[test]
    fn test_busy_timeout_applied() {
        let config = StoreConfig::in_memory().with_busy_timeout_ms(250);
        let conn = connect(&config).unwrap();
        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 250);
    }
}
