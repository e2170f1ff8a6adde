//! Error handling for rowkeep-store
//!
//! Maps `rusqlite::Error` onto the core `RkError`, pulling out the
//! missing-table signal so callers can branch on it.

use rowkeep_core::errors::{RkError, RkErrorKind};

/// Result type alias using RkError
pub use rowkeep_core::errors::Result;

const NO_SUCH_TABLE: &str = "no such table: ";

/// Table name from a "no such table" failure, if that is what `err` is
pub fn missing_table_name(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.strip_prefix(NO_SUCH_TABLE),
        _ => None,
    }
}

/// Create a store error from rusqlite::Error
///
/// The engine message and extended result code are kept verbatim.
pub fn from_rusqlite(err: rusqlite::Error) -> RkError {
    if let Some(table) = missing_table_name(&err) {
        return RkError::new(RkErrorKind::MissingTable)
            .with_op("sqlite")
            .with_table(table)
            .with_message(err.to_string());
    }

    let kind = match err {
        rusqlite::Error::QueryReturnedNoRows => RkErrorKind::NoRows,
        _ => RkErrorKind::Persistence,
    };
    let rk_err = RkError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string());
    match err.sqlite_error() {
        Some(failure) => rk_err.with_sqlite_code(failure.extended_code),
        None => rk_err,
    }
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> RkError {
    RkError::new(RkErrorKind::Config)
        .with_op("config")
        .with_message(reason)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> RkError {
    RkError::new(RkErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
