//! Error types for the changelog engine.

use crate::generator::ValidationErrors;
use thiserror::Error;

/// Main error type for changelog operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No registered generator supports the statement on this database
    #[error("{statement} is not supported on {database}")]
    Unsupported { statement: String, database: String },

    /// A generator rejected the statement before any SQL was produced
    #[error("Validation failed:\n{0}")]
    Validation(ValidationErrors),

    /// A precondition evaluated false under a HALT policy
    #[error("Preconditions failed for {change_set}:\n  {}", .messages.join("\n  "))]
    PreconditionFailed {
        change_set: String,
        messages: Vec<String>,
    },

    /// A precondition could not be evaluated under a HALT policy
    #[error("Precondition error for {change_set}: {message}")]
    PreconditionErrored { change_set: String, message: String },

    /// The database rejected generated SQL
    #[error("Migration failed for change set {change_set}:\n  Reason: {message}\n  SQL: {sql}")]
    Execution {
        change_set: String,
        sql: String,
        message: String,
        #[source]
        source: Option<Box<MigrateError>>,
    },

    /// The change log lock is held by someone else
    #[error("Could not acquire change log lock. Currently locked by {locked_by} since {lock_granted}")]
    LockConflict {
        locked_by: String,
        lock_granted: String,
    },

    /// Lock protocol violation (unexpected row counts, missing lock row)
    #[error("Lock error: {0}")]
    Lock(String),

    /// Previously applied change sets no longer match the change log
    #[error("Checksum validation failed:\n  {}", .0.join("\n  "))]
    ChecksumMismatch(Vec<String>),

    /// Change sets in the rollback range cannot be reversed
    #[error("Rollback is not possible:\n  {}", .0.join("\n  "))]
    RollbackImpossible(Vec<String>),

    /// Change log structure problem (duplicate identifiers, bad filters)
    #[error("Invalid change log: {0}")]
    ChangeLog(String),

    /// Connection-level database error
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {}", postgres_message(.0))]
    Postgres(#[from] tokio_postgres::Error),

    /// History file or history table is unreadable
    #[error("History error: {0}")]
    State(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation was cancelled (connection closed underneath a change set)
    #[error("Operation cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create an Unsupported error for a statement/database pair.
    pub fn unsupported(statement: impl Into<String>, database: impl Into<String>) -> Self {
        MigrateError::Unsupported {
            statement: statement.into(),
            database: database.into(),
        }
    }

    /// Create an Execution error
    pub fn execution(
        change_set: impl Into<String>,
        sql: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MigrateError::Execution {
            change_set: change_set.into(),
            sql: sql.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a driver error raised while running `sql`.
    pub fn failed_sql(sql: impl Into<String>, cause: MigrateError) -> Self {
        let message = match &cause {
            MigrateError::Database(message) => message.clone(),
            #[cfg(feature = "sqlite")]
            MigrateError::Sqlite(e) => e.to_string(),
            #[cfg(feature = "postgres")]
            MigrateError::Postgres(e) => postgres_message(e),
            other => other.to_string(),
        };
        MigrateError::Execution {
            change_set: String::new(),
            sql: sql.into(),
            message,
            source: Some(Box::new(cause)),
        }
    }

    /// Whether the database refused to create something that is already there:
    /// a table or other object, or a row with the same key.
    pub fn is_already_exists(&self) -> bool {
        match self {
            MigrateError::Execution {
                source: Some(cause), ..
            } => cause.is_already_exists(),
            #[cfg(feature = "sqlite")]
            MigrateError::Sqlite(e) => sqlite_already_exists(e),
            #[cfg(feature = "postgres")]
            MigrateError::Postgres(e) => {
                use tokio_postgres::error::SqlState;
                e.code().is_some_and(|code| {
                    [SqlState::DUPLICATE_TABLE, SqlState::DUPLICATE_OBJECT, SqlState::UNIQUE_VIOLATION].contains(code)
                })
            }
            _ => false,
        }
    }

    /// Whether a caller may retry the operation later without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MigrateError::LockConflict { .. })
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::LockConflict { .. } => 3,
            MigrateError::ChecksumMismatch(_)
            | MigrateError::Validation(_)
            | MigrateError::ChangeLog(_) => 4,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// SQLSTATE and server message, or the client-side description.
#[cfg(feature = "postgres")]
fn postgres_message(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => format!("{}: {}", db.code().code(), db.message()),
        None => e.to_string(),
    }
}

#[cfg(feature = "sqlite")]
fn sqlite_already_exists(e: &rusqlite::Error) -> bool {
    use rusqlite::{ffi, ErrorCode};
    let Some(failure) = e.sqlite_error() else {
        return false;
    };
    match failure.code {
        ErrorCode::ConstraintViolation => matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        ),
        // SQLite has no dedicated code for CREATE of an existing object.
        ErrorCode::Unknown => e.to_string().contains("already exists"),
        _ => false,
    }
}

/// Result type alias for changelog operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_conflict_is_retryable() {
        let err = MigrateError::LockConflict {
            locked_by: "build-01 (10.0.0.4)".into(),
            lock_granted: "2024-01-01 00:00:00".into(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("build-01"));
    }

    #[test]
    fn test_execution_error_is_not_retryable() {
        let err = MigrateError::execution("a.yaml::1::bob", "DROP TABLE x", "no such table");
        assert!(!err.is_retryable());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("DROP TABLE x"));
    }

    #[test]
    fn test_checksum_mismatch_lists_every_change_set() {
        let err = MigrateError::ChecksumMismatch(vec!["a::1::x".into(), "a::2::x".into()]);
        let text = err.to_string();
        assert!(text.contains("a::1::x"));
        assert!(text.contains("a::2::x"));
        assert_eq!(err.exit_code(), 4);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_errors_detect_existing_objects_by_code() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        conn.execute_batch("INSERT INTO t VALUES (1)").unwrap();

        let table = MigrateError::from(conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap_err());
        assert!(table.is_already_exists(), "{table}");
        let row = MigrateError::from(conn.execute_batch("INSERT INTO t VALUES (1)").unwrap_err());
        assert!(row.is_already_exists(), "{row}");
        let missing = MigrateError::from(conn.execute_batch("DROP TABLE nope").unwrap_err());
        assert!(!missing.is_already_exists(), "{missing}");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_failed_sql_keeps_driver_error_as_source() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        let driver = conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap_err();

        let err = MigrateError::failed_sql("CREATE TABLE t (id INTEGER)", driver.into());
        assert!(err.is_already_exists());
        assert!(err.to_string().contains("table t already exists"));
        assert!(err.format_detailed().contains("Caused by:\n  1: SQLite error"));
    }

    #[test]
    fn test_message_only_errors_are_never_already_exists() {
        let err = MigrateError::failed_sql("CREATE TABLE t", MigrateError::Database("table t already exists".into()));
        assert!(!err.is_already_exists());
        assert!(!MigrateError::execution("", "CREATE TABLE t", "already exists").is_already_exists());
    }

    #[test]
    fn test_format_detailed_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = MigrateError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
    }
}
