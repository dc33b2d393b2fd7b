//! The connection capability the engine consumes.
//!
//! The engine never opens connections. Callers hand it something that can run
//! SQL text and control the transaction boundary, and every component (history,
//! lock, preconditions, change set execution) goes through this trait.

use async_trait::async_trait;

use crate::error::Result;

use super::value::Row;

/// An already-connected database handle.
///
/// Implementations surface driver errors through their typed
/// [`MigrateError`] variant so callers can inspect error codes (for example
/// to tolerate [`MigrateError::is_already_exists`] during idempotent setup).
///
/// [`MigrateError`]: crate::error::MigrateError
/// [`MigrateError::is_already_exists`]: crate::error::MigrateError::is_already_exists
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a statement that returns no rows, reporting the affected row count.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Run a query and collect every row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Commit the current transaction. A no-op in auto-commit mode.
    async fn commit(&self) -> Result<()>;

    /// Roll back the current transaction. A no-op in auto-commit mode.
    async fn rollback(&self) -> Result<()>;

    /// Whether each statement commits on its own.
    async fn auto_commit(&self) -> Result<bool>;

    /// Switch auto-commit mode. Turning it on commits any open transaction.
    async fn set_auto_commit(&self, enabled: bool) -> Result<()>;

    /// Login name of the connected user, if the driver knows it.
    async fn user_name(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Product name reported by the driver (e.g. "PostgreSQL").
    fn product_name(&self) -> &str;

    /// Query and return the first column of the first row, if any.
    async fn query_scalar(&self, sql: &str) -> Result<Option<crate::core::SqlValue>> {
        let rows = self.query(sql).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get_index(0).cloned()))
    }
}
