//! History kept in the `DATABASECHANGELOG` table.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{history_row, ran_from_row, tag_placeholder, upsert_cached, HistoryService};
use crate::changelog::{ChangeSet, CheckSum, ExecType, RanChangeSet};
use crate::core::Row;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::precondition::catalog::{object_exists, CatalogObject};
use crate::statement::{
    ChangeSetKey, CreateDatabaseChangeLogTableStatement, MarkChangeSetRanStatement,
    RemoveChangeSetRanStatusStatement, SelectFromDatabaseChangeLogStatement, TableRef, TagDatabaseStatement,
    UpdateChangeSetChecksumStatement,
};

/// History backed by a table in the target database.
///
/// Every statement goes through the executor, so in SQL-output mode the
/// bookkeeping writes land in the script next to the change sets.
pub struct TableHistoryService {
    executor: Arc<Executor>,
    table: TableRef,
    deployment_id: String,
    exists: AtomicBool,
    cache: Mutex<Option<Vec<RanChangeSet>>>,
    last_order: Mutex<Option<i64>>,
}

impl TableHistoryService {
    pub fn new(executor: Arc<Executor>, table: TableRef, deployment_id: String) -> Self {
        Self {
            executor,
            table,
            deployment_id,
            exists: AtomicBool::new(false),
            cache: Mutex::new(None),
            last_order: Mutex::new(None),
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
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

    fn cached(&self) -> Option<Vec<RanChangeSet>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update_cache(&self, f: impl FnOnce(&mut Vec<RanChangeSet>)) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ran) = cache.as_mut() {
            f(ran);
        }
    }
}

fn required_text(row: &Row, column: &str) -> Result<String> {
    row.text(column)
        .ok_or_else(|| MigrateError::State(format!("History row is missing {}", column)))
}

fn parse_row(row: &Row) -> Result<RanChangeSet> {
    let exec_type = match row.text("EXECTYPE") {
        Some(text) => text.parse()?,
        None => ExecType::Executed,
    };
    Ok(RanChangeSet {
        key: ChangeSetKey {
            id: required_text(row, "ID")?,
            author: required_text(row, "AUTHOR")?,
            file_path: required_text(row, "FILENAME")?,
        },
        date_executed: row.get("DATEEXECUTED").and_then(|v| v.as_datetime()),
        order_executed: row.get("ORDEREXECUTED").and_then(|v| v.as_i64()).unwrap_or(0),
        exec_type,
        last_checksum: row.text("MD5SUM").filter(|s| !s.trim().is_empty()),
        description: row.text("DESCRIPTION").unwrap_or_default(),
        comments: row.text("COMMENTS").unwrap_or_default(),
        tag: row.text("TAG"),
        liquibase_version: row.text("LIQUIBASE").unwrap_or_default(),
        contexts: row.text("CONTEXTS"),
        labels: row.text("LABELS"),
        deployment_id: row.text("DEPLOYMENT_ID"),
    })
}

#[async_trait]
impl HistoryService for TableHistoryService {
    async fn init(&self) -> Result<()> {
        if self.exists.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.table_exists().await? {
            self.exists.store(true, Ordering::SeqCst);
            return Ok(());
        }

        info!("Creating history table {}", self.table.table_name);
        let create = CreateDatabaseChangeLogTableStatement {
            table: self.table.clone(),
        };
        match self.executor.execute(&create.into()).await {
            Ok(_) => {}
            Err(e) if e.is_already_exists() => {
                debug!("History table was created concurrently");
            }
            Err(e) => return Err(e),
        }
        if !self.executor.is_output() {
            self.executor.commit().await?;
            self.exists.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn ran_change_sets(&self) -> Result<Vec<RanChangeSet>> {
        if let Some(ran) = self.cached() {
            return Ok(ran);
        }

        // An output-mode run against a fresh database sees no table.
        let ran = if self.exists.load(Ordering::SeqCst) || self.table_exists().await? {
            let select = SelectFromDatabaseChangeLogStatement {
                table: self.table.clone(),
            };
            self.executor
                .query(&select.into())
                .await?
                .iter()
                .map(parse_row)
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };
        debug!("Loaded {} history rows", ran.len());
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(ran.clone());
        Ok(ran)
    }

    async fn set_exec_type(
        &self,
        change_set: &ChangeSet,
        exec_type: ExecType,
        checksum: Option<&CheckSum>,
    ) -> Result<()> {
        let existing = self.ran_change_sets().await?.iter().any(|r| r.is_for(change_set));
        let order = self.next_sequence_value().await?;
        let row = history_row(change_set, exec_type, checksum, order, &self.deployment_id);
        let mark = MarkChangeSetRanStatement {
            table: self.table.clone(),
            row: row.clone(),
            update_existing: existing,
        };
        self.executor.execute(&mark.into()).await?;
        self.update_cache(|cache| upsert_cached(cache, ran_from_row(&row, exec_type)));
        Ok(())
    }

    async fn remove_from_history(&self, change_set: &ChangeSet) -> Result<()> {
        let remove = RemoveChangeSetRanStatusStatement {
            table: self.table.clone(),
            key: change_set.key(),
        };
        self.executor.execute(&remove.into()).await?;
        self.update_cache(|cache| cache.retain(|r| !r.is_for(change_set)));
        Ok(())
    }

    async fn tag(&self, tag: &str) -> Result<()> {
        if self.ran_change_sets().await?.is_empty() {
            self.set_exec_type(&tag_placeholder(), ExecType::Executed, None).await?;
        }
        let statement = TagDatabaseStatement {
            table: self.table.clone(),
            tag: tag.to_string(),
        };
        self.executor.execute(&statement.into()).await?;
        self.update_cache(|cache| {
            if let Some(last) = cache.iter_mut().max_by_key(|r| r.order_executed) {
                last.tag = Some(tag.to_string());
            }
        });
        Ok(())
    }

    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self
            .ran_change_sets()
            .await?
            .iter()
            .any(|r| r.tag.as_deref() == Some(tag)))
    }

    async fn replace_checksum(&self, key: &ChangeSetKey, checksum: &CheckSum) -> Result<()> {
        let update = UpdateChangeSetChecksumStatement {
            table: self.table.clone(),
            key: Some(key.clone()),
            md5sum: Some(checksum.to_string()),
        };
        self.executor.execute(&update.into()).await?;
        self.update_cache(|cache| {
            for ran in cache.iter_mut().filter(|r| &r.key == key) {
                ran.last_checksum = Some(checksum.to_string());
            }
        });
        Ok(())
    }

    async fn clear_checksums(&self) -> Result<()> {
        let update = UpdateChangeSetChecksumStatement {
            table: self.table.clone(),
            key: None,
            md5sum: None,
        };
        self.executor.execute(&update.into()).await?;
        self.update_cache(|cache| cache.iter_mut().for_each(|r| r.last_checksum = None));
        Ok(())
    }

    async fn next_sequence_value(&self) -> Result<i64> {
        let known = *self.last_order.lock().unwrap_or_else(|e| e.into_inner());
        let last = match known {
            Some(last) => last,
            None => self
                .ran_change_sets()
                .await?
                .iter()
                .map(|r| r.order_executed)
                .max()
                .unwrap_or(0),
        };
        let next = last + 1;
        *self.last_order.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
        Ok(next)
    }

    fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    async fn reset(&self) {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.last_order.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.exists.store(false, Ordering::SeqCst);
    }

    fn backend_type(&self) -> &'static str {
        "table"
    }
}
