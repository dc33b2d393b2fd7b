//! The lock kept in `DATABASECHANGELOGLOCK`.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{LockRecord, LockService};
use crate::core::Row;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::precondition::catalog::{object_exists, CatalogObject};
use crate::statement::{
    CreateDatabaseChangeLogLockTableStatement, InitializeDatabaseChangeLogLockTableStatement,
    LockDatabaseChangeLogStatement, SelectFromDatabaseChangeLogLockStatement, TableRef,
    UnlockDatabaseChangeLogStatement,
};

const LOCKED_BY_LIMIT: usize = 255;

/// Lock service over a single-row table.
///
/// The protocol: read the row; if free, run a conditional update that only
/// matches an unlocked row and commit. Exactly one process sees one affected
/// row.
pub struct TableLockService {
    executor: Arc<Executor>,
    table: TableRef,
    locked_by: String,
    has_lock: AtomicBool,
    initialized: AtomicBool,
}

impl TableLockService {
    pub fn new(executor: Arc<Executor>, table: TableRef, locked_by: String) -> Self {
        Self {
            executor,
            table,
            locked_by: locked_by.chars().take(LOCKED_BY_LIMIT).collect(),
            has_lock: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn locked_by(&self) -> &str {
        &self.locked_by
    }

    async fn table_exists(&self) -> Result<bool> {
        let database = self.executor.database();
        object_exists(
            self.executor.connection(),
            database,
            CatalogObject::Table,
            self.table.schema_name.as_deref(),
            &database.correct_object_name(&self.table.table_name),
        )
        .await
    }

    /// The lock row(s), or none when the table does not exist yet.
    async fn read_rows(&self) -> Result<Vec<LockRecord>> {
        if !self.initialized.load(Ordering::SeqCst) && !self.table_exists().await? {
            return Ok(Vec::new());
        }
        let select = SelectFromDatabaseChangeLogLockStatement {
            table: self.table.clone(),
        };
        self.executor.query(&select.into()).await?.iter().map(parse_row).collect()
    }

    async fn unlock(&self) -> Result<u64> {
        let unlock = UnlockDatabaseChangeLogStatement {
            table: self.table.clone(),
        };
        let affected = self.executor.execute(&unlock.into()).await?;
        self.executor.commit().await?;
        Ok(affected)
    }
}

fn parse_row(row: &Row) -> Result<LockRecord> {
    Ok(LockRecord {
        id: row
            .get("ID")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| MigrateError::State("Lock row is missing ID".into()))?,
        locked: row.get("LOCKED").and_then(|v| v.as_bool()).unwrap_or(false),
        lock_granted: row.get("LOCKGRANTED").and_then(|v| v.as_datetime()),
        locked_by: row.text("LOCKEDBY"),
    })
}

#[async_trait]
impl LockService for TableLockService {
    async fn init(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let exists = self.table_exists().await?;
        if !exists {
            info!("Creating lock table {}", self.table.table_name);
            let create = CreateDatabaseChangeLogLockTableStatement {
                table: self.table.clone(),
            };
            match self.executor.execute(&create.into()).await {
                Ok(_) => {}
                Err(e) if e.is_already_exists() => debug!("Lock table was created concurrently"),
                Err(e) => return Err(e),
            }
            self.executor.commit().await?;
        }

        // In output mode a new table only exists in the script.
        let needs_seed = if !exists && self.executor.is_output() {
            true
        } else {
            self.read_rows_unchecked().await?.is_empty()
        };
        if needs_seed {
            let initialize = InitializeDatabaseChangeLogLockTableStatement {
                table: self.table.clone(),
            };
            match self.executor.execute(&initialize.into()).await {
                Ok(_) => {}
                Err(e) if e.is_already_exists() => debug!("Lock row was seeded concurrently"),
                Err(e) => return Err(e),
            }
            self.executor.commit().await?;
        }

        if !self.executor.is_output() {
            self.initialized.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn acquire_lock(&self) -> Result<bool> {
        if self.has_lock() {
            return Ok(true);
        }
        self.init().await?;

        // Output mode against a fresh database: nothing can hold the lock.
        let rows = self.read_rows().await?;
        if rows.iter().any(|r| r.locked) {
            return Ok(false);
        }

        let lock = LockDatabaseChangeLogStatement {
            table: self.table.clone(),
            locked_by: self.locked_by.clone(),
            lock_granted: Utc::now().naive_utc(),
        };
        let affected = self.executor.execute(&lock.into()).await?;
        match affected {
            0 => {
                self.executor.rollback().await?;
                Ok(false)
            }
            1 => {
                self.executor.commit().await?;
                self.has_lock.store(true, Ordering::SeqCst);
                info!("Successfully acquired change log lock");
                Ok(true)
            }
            n => {
                self.executor.rollback().await?;
                Err(MigrateError::Lock(format!(
                    "Lock update matched {} rows in {}, expected 1",
                    n, self.table.table_name
                )))
            }
        }
    }

    async fn wait_for_lock(&self) -> Result<()> {
        if self.acquire_lock().await? {
            return Ok(());
        }
        let holder = self.list_locks().await?.into_iter().next();
        Err(MigrateError::LockConflict {
            locked_by: holder
                .as_ref()
                .and_then(|h| h.locked_by.clone())
                .unwrap_or_else(|| "unknown".into()),
            lock_granted: holder
                .and_then(|h| h.lock_granted)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".into()),
        })
    }

    async fn release_lock(&self) -> Result<()> {
        if !self.has_lock() {
            return Ok(());
        }
        let affected = self.unlock().await?;
        self.has_lock.store(false, Ordering::SeqCst);
        if affected != 1 {
            return Err(MigrateError::Lock(format!(
                "Releasing the lock updated {} rows in {}, expected 1",
                affected, self.table.table_name
            )));
        }
        info!("Successfully released change log lock");
        Ok(())
    }

    async fn list_locks(&self) -> Result<Vec<LockRecord>> {
        Ok(self.read_rows().await?.into_iter().filter(|r| r.locked).collect())
    }

    async fn force_release_lock(&self) -> Result<()> {
        self.init().await?;
        let held = self.list_locks().await?;
        for record in &held {
            warn!("Forcing release of {}", record);
        }
        self.unlock().await?;
        self.has_lock.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn has_lock(&self) -> bool {
        self.has_lock.load(Ordering::SeqCst)
    }
}

impl TableLockService {
    /// Rows without the existence check; only valid after creation.
    async fn read_rows_unchecked(&self) -> Result<Vec<LockRecord>> {
        let select = SelectFromDatabaseChangeLogLockStatement {
            table: self.table.clone(),
        };
        self.executor.query(&select.into()).await?.iter().map(parse_row).collect()
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::database::{Database, DatabaseKind};
    use crate::drivers::sqlite::SqliteConnection;
    use crate::generator::GeneratorRegistry;
    use crate::statement::RawSqlStatement;

    fn service(connection: Arc<SqliteConnection>, who: &str) -> TableLockService {
        let executor = Executor::live(
            connection,
            Database::new(DatabaseKind::Sqlite),
            Arc::new(GeneratorRegistry::with_builtins()),
        );
        TableLockService::new(Arc::new(executor), TableRef::new("DATABASECHANGELOGLOCK"), who.into())
    }

    #[tokio::test]
    async fn test_exactly_one_holder() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let first = service(connection.clone(), "first");
        let second = service(connection, "second");

        assert!(first.acquire_lock().await.unwrap());
        assert!(first.has_lock());
        assert!(!second.acquire_lock().await.unwrap());

        match second.wait_for_lock().await {
            Err(MigrateError::LockConflict { locked_by, .. }) => assert_eq!(locked_by, "first"),
            other => panic!("unexpected {other:?}"),
        }

        first.release_lock().await.unwrap();
        assert!(second.acquire_lock().await.unwrap());
    }

    #[tokio::test]
    async fn test_init_is_idempotent_across_services() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        service(connection.clone(), "a").init().await.unwrap();
        service(connection.clone(), "b").init().await.unwrap();
        let rows = service(connection, "c").read_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].locked);
    }

    #[tokio::test]
    async fn test_setup_races_are_recognised_by_error_code() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let lock = service(connection, "a");
        lock.init().await.unwrap();

        let create = CreateDatabaseChangeLogLockTableStatement {
            table: lock.table.clone(),
        };
        let err = lock.executor.execute(&create.into()).await.unwrap_err();
        assert!(err.is_already_exists(), "{err}");

        let duplicate_row = RawSqlStatement::new("INSERT INTO DATABASECHANGELOGLOCK (ID, LOCKED) VALUES (1, 0)");
        let err = lock.executor.execute(&duplicate_row.into()).await.unwrap_err();
        assert!(err.is_already_exists(), "{err}");

        let missing = RawSqlStatement::new("DELETE FROM NO_SUCH_TABLE");
        let err = lock.executor.execute(&missing.into()).await.unwrap_err();
        assert!(!err.is_already_exists(), "{err}");
    }

    #[tokio::test]
    async fn test_list_and_force_release() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let holder = service(connection.clone(), "stuck-host");
        holder.acquire_lock().await.unwrap();

        let admin = service(connection, "admin");
        let locks = admin.list_locks().await.unwrap();
        assert_eq!(locks.len(), 1);
        assert_eq!(locks[0].locked_by.as_deref(), Some("stuck-host"));
        assert!(locks[0].lock_granted.is_some());

        admin.force_release_lock().await.unwrap();
        assert!(admin.list_locks().await.unwrap().is_empty());
        assert!(admin.acquire_lock().await.unwrap());
    }
}
