//! SQLite driver over rusqlite.
//!
//! rusqlite is synchronous, so every call runs on the blocking pool with the
//! connection behind a mutex. Auto-commit off is emulated by opening a
//! transaction before the first write and closing it on commit or rollback.

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::core::{Connection, Row, SqlValue};
use crate::error::{MigrateError, Result};

struct Inner {
    conn: rusqlite::Connection,
    auto_commit: bool,
}

/// A SQLite database handle.
#[derive(Clone)]
pub struct SqliteConnection {
    inner: Arc<Mutex<Inner>>,
}

fn value_of(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Int(v),
        ValueRef::Real(v) => SqlValue::Float(v),
        ValueRef::Text(v) => SqlValue::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => SqlValue::Text(hex::encode(v)),
    }
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self::wrap(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: rusqlite::Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { conn, auto_commit: true })),
        }
    }

    /// Run `f` with the connection on the blocking pool.
    async fn with<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inner) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| MigrateError::Database("SQLite connection mutex poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| MigrateError::Database(format!("SQLite task failed: {}", e)))?
    }
}

fn run(conn: &rusqlite::Connection, sql: &str) -> Result<u64> {
    let trimmed = sql.trim().trim_end_matches(';');
    if trimmed.contains(';') {
        conn.execute_batch(trimmed)?;
        return Ok(conn.changes());
    }
    let mut statement = conn.prepare(trimmed)?;
    if statement.column_count() > 0 {
        let mut rows = statement.raw_query();
        while rows.next()?.is_some() {}
        return Ok(0);
    }
    Ok(statement.execute([])? as u64)
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let sql = sql.to_string();
        self.with(move |inner| {
            if !inner.auto_commit && inner.conn.is_autocommit() {
                debug!("BEGIN");
                inner.conn.execute_batch("BEGIN")?;
            }
            run(&inner.conn, &sql)
        })
        .await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let sql = sql.to_string();
        self.with(move |inner| {
            let mut statement = inner.conn.prepare(&sql)?;
            let columns: Vec<String> = statement.column_names().iter().map(|c| c.to_string()).collect();
            let mut rows = statement.query([])?;
            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    values.push(value_of(row.get_ref(index)?));
                }
                result.push(Row::new(columns.clone(), values));
            }
            Ok(result)
        })
        .await
    }

    async fn commit(&self) -> Result<()> {
        self.with(|inner| {
            if !inner.conn.is_autocommit() {
                inner.conn.execute_batch("COMMIT")?;
            }
            Ok(())
        })
        .await
    }

    async fn rollback(&self) -> Result<()> {
        self.with(|inner| {
            if !inner.conn.is_autocommit() {
                inner.conn.execute_batch("ROLLBACK")?;
            }
            Ok(())
        })
        .await
    }

    async fn auto_commit(&self) -> Result<bool> {
        self.with(|inner| Ok(inner.auto_commit)).await
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        self.with(move |inner| {
            if enabled && !inner.conn.is_autocommit() {
                inner.conn.execute_batch("COMMIT")?;
            }
            inner.auto_commit = enabled;
            Ok(())
        })
        .await
    }

    fn product_name(&self) -> &str {
        "SQLite"
    }
}
