//! In-memory [`Connection`] for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::core::{Connection, Row, SqlValue};
use crate::error::{MigrateError, Result};

#[derive(Default)]
struct State {
    executed: Vec<String>,
    failures: HashMap<String, String>,
    auto_commit: bool,
    commits: usize,
    rollbacks: usize,
}

/// Records executed SQL and answers queries from canned results.
///
/// Queries without a canned result fail, which is how tests simulate a
/// missing table.
pub struct MockConnection {
    results: HashMap<String, Vec<Row>>,
    state: Mutex<State>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            state: Mutex::new(State {
                auto_commit: true,
                ..State::default()
            }),
        }
    }

    /// Answer `sql` with a single one-column row.
    pub fn with_scalar(self, sql: &str, value: impl Into<SqlValue>) -> Self {
        self.with_rows(sql, vec![Row::new(vec!["VALUE".into()], vec![value.into()])])
    }

    pub fn with_rows(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.results.insert(sql.to_string(), rows);
        self
    }

    /// Make `execute(sql)` fail with `message`.
    pub fn fail_on(&self, sql: &str, message: &str) {
        self.lock().failures.insert(sql.to_string(), message.to_string());
    }

    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut state = self.lock();
        if let Some(message) = state.failures.get(sql) {
            return Err(MigrateError::Database(message.clone()));
        }
        state.executed.push(sql.to_string());
        Ok(1)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| MigrateError::Database(format!("no result for '{}'", sql)))
    }

    async fn commit(&self) -> Result<()> {
        self.lock().commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.lock().rollbacks += 1;
        Ok(())
    }

    async fn auto_commit(&self) -> Result<bool> {
        Ok(self.lock().auto_commit)
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        self.lock().auto_commit = enabled;
        Ok(())
    }

    fn product_name(&self) -> &str {
        "Mock"
    }
}
