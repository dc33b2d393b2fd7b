//! Statement execution: against the connection, or into a SQL script.
//!
//! In output mode every mutating statement is rendered into a script buffer
//! instead of being sent, while reads (history, lock state, preconditions)
//! still go to the connection so the script reflects what the database
//! actually needs.

use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::core::{Connection, Row};
use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::generator::{GeneratorRegistry, Sql};
use crate::statement::{Statement, StatementKind};

struct ScriptBuffer {
    delimiter: String,
    text: Mutex<String>,
}

/// Runs statements generated for one database.
pub struct Executor {
    connection: Arc<dyn Connection>,
    database: Database,
    registry: Arc<GeneratorRegistry>,
    script: Option<ScriptBuffer>,
}

impl Executor {
    /// Send statements to the connection.
    pub fn live(connection: Arc<dyn Connection>, database: Database, registry: Arc<GeneratorRegistry>) -> Self {
        Self {
            connection,
            database,
            registry,
            script: None,
        }
    }

    /// Write statements to a script, ending each with `delimiter`.
    pub fn output(
        connection: Arc<dyn Connection>,
        database: Database,
        registry: Arc<GeneratorRegistry>,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            database,
            registry,
            script: Some(ScriptBuffer {
                delimiter: delimiter.into(),
                text: Mutex::new(String::new()),
            }),
        }
    }

    pub fn is_output(&self) -> bool {
        self.script.is_some()
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn shared_connection(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.connection)
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// SQL for a statement, validated.
    pub fn generate(&self, statement: &Statement) -> Result<Vec<Sql>> {
        self.registry.generate_sql(statement, &self.database)
    }

    /// Run a mutating statement and report the affected row count.
    ///
    /// Comment statements only reach a script. In output mode every
    /// statement reports one affected row.
    pub async fn execute(&self, statement: &Statement) -> Result<u64> {
        let sql = self.generate(statement)?;
        if let Some(script) = &self.script {
            for unit in &sql {
                script.write(unit);
            }
            return Ok(1);
        }

        if statement.kind() == StatementKind::Comment {
            return Ok(0);
        }
        let mut affected = 0;
        for unit in &sql {
            affected += self.send(unit.text()).await?;
        }
        Ok(affected)
    }

    async fn send(&self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "executing");
        self.connection.execute(sql).await.map_err(|e| match e {
            MigrateError::Cancelled => MigrateError::Cancelled,
            cause => MigrateError::failed_sql(sql, cause),
        })
    }

    /// Run a query. Reads always go to the connection.
    pub async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for unit in self.generate(statement)? {
            debug!(sql = %unit.text(), "querying");
            rows.extend(self.connection.query(unit.text()).await?);
        }
        Ok(rows)
    }

    /// Add a `--` comment to the script. Ignored in live mode.
    pub fn comment(&self, text: &str) {
        if let Some(script) = &self.script {
            let mut buffer = script.text.lock().unwrap_or_else(|e| e.into_inner());
            for line in text.lines() {
                buffer.push_str(self.database.line_comment());
                buffer.push(' ');
                buffer.push_str(line);
                buffer.push('\n');
            }
        }
    }

    /// Drain the script written so far.
    pub fn take_output(&self) -> String {
        match &self.script {
            Some(script) => std::mem::take(&mut *script.text.lock().unwrap_or_else(|e| e.into_inner())),
            None => String::new(),
        }
    }

    pub async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        if self.is_output() {
            return Ok(());
        }
        if self.connection.auto_commit().await? != enabled {
            debug!(enabled, "switching auto-commit");
            self.connection.set_auto_commit(enabled).await?;
        }
        Ok(())
    }

    pub async fn commit(&self) -> Result<()> {
        if self.is_output() {
            return Ok(());
        }
        self.connection.commit().await
    }

    pub async fn rollback(&self) -> Result<()> {
        if self.is_output() {
            return Ok(());
        }
        self.connection.rollback().await
    }
}

impl ScriptBuffer {
    fn write(&self, sql: &Sql) {
        let mut buffer = self.text.lock().unwrap_or_else(|e| e.into_inner());
        buffer.push_str(&sql.to_script(&self.delimiter));
    }
}
