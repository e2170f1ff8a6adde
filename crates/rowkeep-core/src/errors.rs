use thiserror::Error;

/// Result type alias using the structured [`RkError`]
pub type Result<T> = std::result::Result<T, RkError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that leaves rowkeep is classified by one of these kinds.
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RkErrorKind {
    // Engine signals
    /// The statement referenced a table that does not exist yet
    MissingTable,
    /// A single-row fetch produced no row
    NoRows,
    /// Any other failure reported by the embedded engine
    Persistence,

    // Caller contract
    InvalidInput,
    TypeMismatch,
    TableNameCollision,

    // Integration
    Io,
    Config,
}

impl RkErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RkErrorKind::MissingTable => "ERR_MISSING_TABLE",
            RkErrorKind::NoRows => "ERR_NO_ROWS",
            RkErrorKind::Persistence => "ERR_PERSISTENCE",
            RkErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            RkErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            RkErrorKind::TableNameCollision => "ERR_TABLE_NAME_COLLISION",
            RkErrorKind::Io => "ERR_IO",
            RkErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification kind plus the context that was known where
/// the failure happened: the operation, the record type, the table, the
/// offending field and the engine's extended result code.
#[derive(Debug, Clone, PartialEq)]
pub struct RkError {
    kind: RkErrorKind,
    op: Option<String>,
    record: Option<String>,
    table: Option<String>,
    field: Option<String>,
    sqlite_code: Option<i32>,
    message: String,
}

impl RkError {
    /// Create a new error with the specified kind
    pub fn new(kind: RkErrorKind) -> Self {
        Self {
            kind,
            op: None,
            record: None,
            table: None,
            field: None,
            sqlite_code: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add record type context
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add the engine's extended result code
    pub fn with_sqlite_code(mut self, code: i32) -> Self {
        self.sqlite_code = Some(code);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> RkErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the record type context, if any
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the field context, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the engine's extended result code, if any
    pub fn sqlite_code(&self) -> Option<i32> {
        self.sqlite_code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when this is a missing-table signal for exactly `table`
    pub fn is_missing_table(&self, table: &str) -> bool {
        self.kind == RkErrorKind::MissingTable && self.table.as_deref() == Some(table)
    }
}

impl std::fmt::Display for RkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(record) = &self.record {
            write!(f, " (record: {})", record)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(code) = self.sqlite_code {
            write!(f, " (sqlite_code: {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for RkError {}

// ========== End Error Facility ==========

/// Domain failures raised while mapping records to rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowkeepError {
    /// A column value could not be converted into the field's Rust type
    #[error("Field {field} of {record} expects {expected}, found {found}")]
    ValueTypeMismatch {
        record: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A row or value list did not have one value per field
    #[error("Record {record} has {expected} fields but {found} values were supplied")]
    FieldCountMismatch {
        record: String,
        expected: usize,
        found: usize,
    },

    /// Primary-key values did not line up with the primary-key fields
    #[error("Record {record} has {expected} primary-key fields but {found} values were supplied")]
    PrimaryKeyArityMismatch {
        record: String,
        expected: usize,
        found: usize,
    },

    /// Two distinct record types flatten to the same table name
    #[error("Table {table} is already mapped to {existing}; {record} cannot share it")]
    TableNameCollision {
        table: String,
        existing: String,
        record: String,
    },
}

impl From<RowkeepError> for RkError {
    fn from(err: RowkeepError) -> Self {
        let message = err.to_string();
        match err {
            RowkeepError::ValueTypeMismatch { record, field, .. } => {
                RkError::new(RkErrorKind::TypeMismatch)
                    .with_record(record)
                    .with_field(field)
                    .with_message(message)
            }
            RowkeepError::FieldCountMismatch { record, .. }
            | RowkeepError::PrimaryKeyArityMismatch { record, .. } => {
                RkError::new(RkErrorKind::InvalidInput)
                    .with_record(record)
                    .with_message(message)
            }
            RowkeepError::TableNameCollision { table, record, .. } => {
                RkError::new(RkErrorKind::TableNameCollision)
                    .with_record(record)
                    .with_table(table)
                    .with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_context() {
        let err = RkError::new(RkErrorKind::MissingTable)
            .with_op("put")
            .with_table("Post")
            .with_message("no such table: Post");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_MISSING_TABLE]"));
        assert!(rendered.contains("in operation 'put'"));
        assert!(rendered.contains("(table: Post)"));
    }

    #[test]
    fn test_is_missing_table_requires_exact_name() {
        let err = RkError::new(RkErrorKind::MissingTable).with_table("Post");
        assert!(err.is_missing_table("Post"));
        assert!(!err.is_missing_table("Comment"));
        assert!(!RkError::new(RkErrorKind::Persistence)
            .with_table("Post")
            .is_missing_table("Post"));
    }
}
