//! Store configuration
//!
//! A store is configured by where its database lives (an absent path means
//! in-memory) plus a couple of connection pragmas. Config can be built in
//! code or read from TOML:
//!
//! ```toml
//! path = "data/records.db"
//! journal_mode = "wal"
//! busy_timeout_ms = 500
//! ```

use crate::errors::{config_error, io_error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Journal mode applied when the connection opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Leave the engine's default in place
    #[default]
    Default,
    /// Write-ahead logging (file databases only)
    Wal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database
    pub path: Option<PathBuf>,
    pub journal_mode: JournalMode,
    pub busy_timeout_ms: Option<u64>,
}

impl StoreConfig {
    /// In-memory database with default pragmas
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// File-backed database with default pragmas
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn with_busy_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    /// Parse config from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| config_error(e.to_string()))
    }

    /// Read and parse a TOML config file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let source =
            std::fs::read_to_string(path.as_ref()).map_err(|e| io_error("config_read", e))?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkeep_core::errors::RkErrorKind;

    #[test]
    fn test_default_is_in_memory() {
        let config = StoreConfig::default();
        assert!(config.is_in_memory());
        assert_eq!(config.journal_mode, JournalMode::Default);
        assert_eq!(config.busy_timeout_ms, None);
    }

    #[test]
    fn test_parse_full_toml() {
        let config = StoreConfig::from_toml_str(
            r#"
            path = "data/records.db"
            journal_mode = "wal"
            busy_timeout_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.path, Some(PathBuf::from("data/records.db")));
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.busy_timeout_ms, Some(500));
    }

    #[test]
    fn test_empty_toml_means_in_memory() {
        assert_eq!(
            StoreConfig::from_toml_str("").unwrap(),
            StoreConfig::in_memory()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = StoreConfig::from_toml_str("pool_size = 4").unwrap_err();
        assert_eq!(err.kind(), RkErrorKind::Config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = StoreConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.kind(), RkErrorKind::Io);
    }
}
