//! PostgreSQL driver over tokio-postgres.
//!
//! Everything goes through the simple query protocol, so result values come
//! back as text and are typed lazily by [`SqlValue`] accessors. Auto-commit
//! off is emulated with an explicit `BEGIN` before the first write.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio_postgres::{Client, Config as PgConfig, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info};

use crate::core::{Connection, Row, SqlValue};
use crate::error::{MigrateError, Result};

#[derive(Debug, Default)]
struct TxState {
    manual: bool,
    open: bool,
}

/// A single PostgreSQL session.
pub struct PostgresConnection {
    client: Client,
    state: Mutex<TxState>,
}

impl PostgresConnection {
    /// Connect with a `postgres://` URL or a key/value connection string.
    pub async fn connect(url: &str) -> Result<Self> {
        let config: PgConfig = url
            .parse()
            .map_err(|e| MigrateError::Config(format!("Invalid PostgreSQL connection string: {}", e)))?;
        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        client.simple_query("SELECT 1").await?;
        info!(
            "Connected to PostgreSQL: {}",
            config.get_dbname().unwrap_or("(default database)")
        );

        Ok(Self {
            client,
            state: Mutex::new(TxState::default()),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a transaction when auto-commit is off and none is open.
    async fn ensure_transaction(&self) -> Result<()> {
        let needs_begin = {
            let state = self.state();
            state.manual && !state.open
        };
        if needs_begin {
            self.client.batch_execute("BEGIN").await?;
            self.state().open = true;
        }
        Ok(())
    }

    async fn finish(&self, statement: &str) -> Result<()> {
        let open = std::mem::replace(&mut self.state().open, false);
        if open {
            debug!("{}", statement);
            self.client.batch_execute(statement).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.ensure_transaction().await?;
        let messages = self.client.simple_query(sql).await?;
        Ok(messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let messages = self.client.simple_query(sql).await?;
        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
                let values = (0..columns.len())
                    .map(|i| match row.get(i) {
                        Some(text) => SqlValue::Text(text.to_string()),
                        None => SqlValue::Null,
                    })
                    .collect();
                rows.push(Row::new(columns, values));
            }
        }
        Ok(rows)
    }

    async fn commit(&self) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK").await
    }

    async fn auto_commit(&self) -> Result<bool> {
        Ok(!self.state().manual)
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.commit().await?;
        }
        self.state().manual = !enabled;
        Ok(())
    }

    async fn user_name(&self) -> Result<Option<String>> {
        Ok(self
            .query_scalar("SELECT current_user")
            .await?
            .and_then(|v| v.as_text()))
    }

    fn product_name(&self) -> &str {
        "PostgreSQL"
    }
}
