//! Statements the history and lock services issue against their own tables.
//!
//! These go through the generator registry like any other statement, so
//! dialect quirks (boolean literals, timestamp functions, quoting) are handled
//! in one place.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A possibly schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub table_name: String,
}

impl TableRef {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
        }
    }

    pub fn with_schema(mut self, schema_name: Option<String>) -> Self {
        self.schema_name = schema_name;
        self
    }
}

/// Identity of a change set in the history table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeSetKey {
    pub id: String,
    pub author: String,
    pub file_path: String,
}

/// Column values of one history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub key: ChangeSetKey,
    pub order_executed: i64,
    pub exec_type: String,
    pub md5sum: Option<String>,
    pub description: String,
    pub comments: String,
    pub tag: Option<String>,
    pub liquibase_version: String,
    pub contexts: Option<String>,
    pub labels: Option<String>,
    pub deployment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatabaseChangeLogTableStatement {
    pub table: TableRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectFromDatabaseChangeLogStatement {
    pub table: TableRef,
}

/// Insert a history row, or update the existing one when re-running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkChangeSetRanStatement {
    pub table: TableRef,
    pub row: HistoryRow,
    pub update_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveChangeSetRanStatusStatement {
    pub table: TableRef,
    pub key: ChangeSetKey,
}

/// Rewrite or clear (`md5sum = None`) a stored checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChangeSetChecksumStatement {
    pub table: TableRef,
    pub key: Option<ChangeSetKey>,
    pub md5sum: Option<String>,
}

/// Tag the most recently executed history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDatabaseStatement {
    pub table: TableRef,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatabaseChangeLogLockTableStatement {
    pub table: TableRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeDatabaseChangeLogLockTableStatement {
    pub table: TableRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectFromDatabaseChangeLogLockStatement {
    pub table: TableRef,
}

/// Conditional update that takes the lock only if it is free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockDatabaseChangeLogStatement {
    pub table: TableRef,
    pub locked_by: String,
    pub lock_granted: NaiveDateTime,
}

/// Unconditional reset of the lock row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockDatabaseChangeLogStatement {
    pub table: TableRef,
}
