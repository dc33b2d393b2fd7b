//! Migration operations over one database.
//!
//! The [`Migrator`] ties the pieces together for each operation:
//!
//! 1. Build an [`Executor`] (live or SQL output) with history and lock
//!    services bound to it
//! 2. Take the change log lock
//! 3. Create the history storage, validate the change log and upgrade old
//!    checksums
//! 4. Walk the change log with the operation's filters and visitor
//! 5. Release the lock, also when the work failed
//!
//! Read-only operations (`status`, `history`, `validate`, `list_locks`) skip
//! the lock and never create anything.

mod docs;

pub use docs::render_change_log_sql;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::changelog::filter::creates_tag;
use crate::changelog::{
    AfterTagFilter, AlreadyRanFilter, ChangeLog, ChangeLogIterator, ChangeLogSyncVisitor, ChangeSet,
    ChangeSetFilter, ChangeSetStatus, ChangeSetVisitor, ChecksumVersion, ContextFilter, Contexts, CountFilter,
    DbmsFilter, ExecutedAfterFilter, LabelExpression, LabelFilter, RanChangeSet, RollbackVisitor, RunContext,
    RunSummary, ShouldRunFilter, StatusVisitor, UpToTagFilter, UpdateVisitor, ValidatingVisitor,
};
use crate::config::Config;
use crate::core::Connection;
use crate::database::Database;
use crate::drivers;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::generator::GeneratorRegistry;
use crate::history::{generate_deployment_id, FileHistoryService, HistoryService, TableHistoryService, ENGINE_VERSION};
use crate::lock::{host_identity, LockRecord, LockService, TableLockService};
use crate::precondition::PreconditionAction;

/// Where a rollback stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackTarget {
    /// Undo the last `n` change sets.
    Count(usize),
    /// Undo everything executed after the row carrying this tag.
    Tag(String),
    /// Undo everything executed after this instant.
    Date(DateTime<Utc>),
}

/// How far an update goes.
enum UpdateLimit {
    All,
    Count(usize),
    Tag(String),
}

/// Executor, history and lock for one operation.
struct Session {
    executor: Arc<Executor>,
    history: Arc<dyn HistoryService>,
    lock: TableLockService,
}

/// Forwards to a visitor until cancellation is requested.
struct Cancellable<'v> {
    inner: &'v mut dyn ChangeSetVisitor,
    cancel: Option<watch::Receiver<bool>>,
}

#[async_trait::async_trait]
impl ChangeSetVisitor for Cancellable<'_> {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        let cancelled = self.cancel.as_ref().is_some_and(|c| *c.borrow());
        if cancelled {
            warn!("Cancelled before {}", change_set);
            return Err(MigrateError::Cancelled);
        }
        self.inner.visit(change_set, ctx).await
    }

    async fn skipped(&mut self, change_set: &ChangeSet, reasons: &[String], ctx: &RunContext<'_>) -> Result<()> {
        self.inner.skipped(change_set, reasons, ctx).await
    }

    fn summary(&self) -> &RunSummary {
        self.inner.summary()
    }
}

/// Runs migration operations for one change log against one database.
pub struct Migrator {
    connection: Arc<dyn Connection>,
    database: Database,
    registry: Arc<GeneratorRegistry>,
    config: Config,
    change_log: ChangeLog,
    checksum_version: ChecksumVersion,
    deployment_id: String,
    locked_by: String,
    cancel: Option<watch::Receiver<bool>>,
}

impl Migrator {
    pub fn new(database: Database, connection: Arc<dyn Connection>, config: Config) -> Result<Self> {
        let checksum_version = config.checksum_version()?;
        let deployment_id = config
            .run
            .deployment_id
            .clone()
            .unwrap_or_else(generate_deployment_id);
        let locked_by = config.run.host_identity.clone().unwrap_or_else(host_identity);
        info!(
            "Migrator ready for {} (config hash {}, deployment {})",
            database,
            &config.hash()[..12],
            deployment_id
        );
        Ok(Self {
            connection,
            database,
            registry: Arc::new(GeneratorRegistry::with_builtins()),
            config,
            change_log: ChangeLog::default(),
            checksum_version,
            deployment_id,
            locked_by,
            cancel: None,
        })
    }

    /// Connect with `database.url` and build a migrator.
    pub async fn connect(config: Config) -> Result<Self> {
        let url = config
            .database
            .url
            .clone()
            .ok_or_else(|| MigrateError::Config("database.url is required to connect".into()))?;
        let connection = drivers::connect(&url).await?;
        let database = config.database()?;
        Self::new(database, connection, config)
    }

    pub fn with_change_log(mut self, change_log: ChangeLog) -> Self {
        self.change_log = change_log;
        self
    }

    pub fn with_registry(mut self, registry: Arc<GeneratorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Stop between change sets once `cancel` turns true.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    fn session(&self, output: bool) -> Session {
        let executor = Arc::new(if output {
            Executor::output(
                Arc::clone(&self.connection),
                self.database.clone(),
                Arc::clone(&self.registry),
                self.config.run.output_delimiter.clone(),
            )
        } else {
            Executor::live(Arc::clone(&self.connection), self.database.clone(), Arc::clone(&self.registry))
        });
        let history: Arc<dyn HistoryService> = match &self.config.changelog.history_file {
            Some(path) => Arc::new(FileHistoryService::new(path.clone(), self.deployment_id.clone()).dry_run(output)),
            None => Arc::new(TableHistoryService::new(
                Arc::clone(&executor),
                self.config.history_table(),
                self.deployment_id.clone(),
            )),
        };
        let lock = TableLockService::new(Arc::clone(&executor), self.config.lock_table(), self.locked_by.clone());
        Session {
            executor,
            history,
            lock,
        }
    }

    fn run_context<'a>(&'a self, session: &'a Session, ran: &'a [RanChangeSet]) -> RunContext<'a> {
        RunContext {
            executor: session.executor.as_ref(),
            history: session.history.as_ref(),
            change_log: &self.change_log,
            ran,
            checksum_version: self.checksum_version,
        }
    }

    fn guarded<'v>(&self, visitor: &'v mut dyn ChangeSetVisitor) -> Cancellable<'v> {
        Cancellable {
            inner: visitor,
            cancel: self.cancel.clone(),
        }
    }

    /// Context, label and dbms filters.
    fn selection_filters<'a>(
        &self,
        contexts: &Contexts,
        labels: &LabelExpression,
    ) -> Vec<Box<dyn ChangeSetFilter + 'a>> {
        vec![
            Box::new(ContextFilter::new(contexts.clone())),
            Box::new(LabelFilter::new(labels.clone())),
            Box::new(DbmsFilter::new(self.database.clone())),
        ]
    }

    /// Script banner for SQL output.
    fn write_header(&self, executor: &Executor, title: &str) {
        let rule = "*".repeat(69);
        executor.comment(&rule);
        executor.comment(title);
        executor.comment(&rule);
        executor.comment(&format!("Change Log: {}", self.change_log.file_path));
        executor.comment(&format!("Ran at: {}", Utc::now().format("%Y-%m-%d %H:%M:%S")));
        executor.comment(&format!("Against: {}", self.database));
        executor.comment(&format!("changelog-migrate version: {}", ENGINE_VERSION));
        executor.comment(&rule);
        executor.comment("");
    }

    fn flush(session: &Session, output: &mut dyn Write) -> Result<()> {
        output.write_all(session.executor.take_output().as_bytes())?;
        output.flush()?;
        Ok(())
    }

    /// Run `work` while holding the change log lock.
    async fn locked<T>(&self, session: &Session, work: impl Future<Output = Result<T>>) -> Result<T> {
        let executor = session.executor.as_ref();
        let auto_commit = self.connection.auto_commit().await?;

        executor.comment("Lock Database");
        session.lock.wait_for_lock().await?;
        let result = work.await;

        if let Err(e) = executor.set_auto_commit(auto_commit).await {
            warn!("Could not restore auto-commit: {}", e);
        }
        executor.comment("Release Database Lock");
        let released = session.lock.release_lock().await;
        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_error)) => {
                warn!("Failed to release change log lock: {}", release_error);
                Err(e)
            }
        }
    }

    /// Create the history, validate the change log and upgrade checksums.
    /// Returns the history as it stands afterwards and the change log
    /// precondition verdict.
    async fn prepare(
        &self,
        session: &Session,
        contexts: &Contexts,
        labels: &LabelExpression,
        upgrade_checksums: bool,
    ) -> Result<(Vec<RanChangeSet>, PreconditionAction)> {
        session.history.init().await?;
        let ran = session.history.ran_change_sets().await?;

        let mut validator = ValidatingVisitor::new().upgrade_checksums(upgrade_checksums);
        let action = {
            let ctx = self.run_context(session, &ran);
            let action = validator.check_change_log_preconditions(&ctx).await?;
            ChangeLogIterator::new(&self.change_log.change_sets, self.selection_filters(contexts, labels))
                .run(&mut validator, &ctx)
                .await?;
            action
        };
        validator.result()?;

        if validator.upgraded().is_empty() {
            return Ok((ran, action));
        }
        info!("Updated stored checksums of {} change sets", validator.upgraded().len());
        session.executor.commit().await?;
        Ok((session.history.ran_change_sets().await?, action))
    }

    async fn run_update(
        &self,
        session: &Session,
        limit: UpdateLimit,
        contexts: &Contexts,
        labels: &LabelExpression,
    ) -> Result<RunSummary> {
        self.locked(session, async {
            let (ran, action) = self.prepare(session, contexts, labels, true).await?;
            if let PreconditionAction::Skip(reason) | PreconditionAction::MarkRan(reason) = &action {
                info!("Skipping change log {}: {}", self.change_log.file_path, reason);
                return Ok(RunSummary::default());
            }

            let mut filters: Vec<Box<dyn ChangeSetFilter + '_>> = Vec::new();
            if let UpdateLimit::Tag(tag) = &limit {
                let known = ran.iter().any(|r| r.tag.as_deref() == Some(tag.as_str()))
                    || self.change_log.change_sets.iter().any(|cs| creates_tag(cs, tag));
                if !known {
                    return Err(MigrateError::ChangeLog(format!(
                        "The tag '{}' was not found in the change log or the history",
                        tag
                    )));
                }
                filters.push(Box::new(UpToTagFilter::new(tag, &ran)));
            }
            filters.push(Box::new(ShouldRunFilter::new(&ran, self.database.clone())));
            filters.extend(self.selection_filters(contexts, labels));
            if let UpdateLimit::Count(count) = &limit {
                filters.push(Box::new(CountFilter::new(*count)));
            }

            let ctx = self.run_context(session, &ran);
            let mut visitor = UpdateVisitor::new();
            ChangeLogIterator::new(&self.change_log.change_sets, filters)
                .run(&mut self.guarded(&mut visitor), &ctx)
                .await?;

            if let Some(tag) = &self.config.run.tag_on_update {
                session.history.tag(tag).await?;
                session.executor.commit().await?;
                info!("Tagged database with '{}'", tag);
            }
            let summary = visitor.summary().clone();
            info!("Update complete: {}", summary);
            Ok(summary)
        })
        .await
    }

    /// Apply every pending change set.
    pub async fn update(&self, contexts: &Contexts, labels: &LabelExpression) -> Result<RunSummary> {
        let session = self.session(false);
        self.run_update(&session, UpdateLimit::All, contexts, labels).await
    }

    /// Write the SQL an update would run instead of running it.
    pub async fn update_sql(
        &self,
        contexts: &Contexts,
        labels: &LabelExpression,
        output: &mut dyn Write,
    ) -> Result<RunSummary> {
        let session = self.session(true);
        self.write_header(&session.executor, "Update Database Script");
        let summary = self.run_update(&session, UpdateLimit::All, contexts, labels).await?;
        Self::flush(&session, output)?;
        Ok(summary)
    }

    /// Apply at most `count` pending change sets.
    pub async fn update_count(
        &self,
        count: usize,
        contexts: &Contexts,
        labels: &LabelExpression,
    ) -> Result<RunSummary> {
        let session = self.session(false);
        self.run_update(&session, UpdateLimit::Count(count), contexts, labels).await
    }

    /// Apply pending change sets up to the one that creates `tag`.
    pub async fn update_to_tag(&self, tag: &str, contexts: &Contexts, labels: &LabelExpression) -> Result<RunSummary> {
        let session = self.session(false);
        self.run_update(&session, UpdateLimit::Tag(tag.to_string()), contexts, labels)
            .await
    }

    /// Ran change sets present in the change log, in execution order.
    fn ran_in_change_log<'a>(&'a self, ran: &[RanChangeSet]) -> Vec<&'a ChangeSet> {
        ran.iter()
            .filter(|r| r.exec_type.counts_as_ran())
            .filter_map(|r| {
                let found = self.change_log.get(&r.key);
                if found.is_none() {
                    warn!(
                        "{}::{}::{} is in the history but not in the change log",
                        r.key.file_path, r.key.id, r.key.author
                    );
                }
                found
            })
            .collect()
    }

    async fn run_rollback(
        &self,
        session: &Session,
        target: &RollbackTarget,
        contexts: &Contexts,
        labels: &LabelExpression,
    ) -> Result<RunSummary> {
        self.locked(session, async {
            let (ran, _) = self.prepare(session, contexts, labels, false).await?;
            let executed = self.ran_in_change_log(&ran);

            let mut filters: Vec<Box<dyn ChangeSetFilter + '_>> = vec![Box::new(AlreadyRanFilter::new(&ran))];
            filters.extend(self.selection_filters(contexts, labels));
            match target {
                RollbackTarget::Count(count) => filters.push(Box::new(CountFilter::new(*count))),
                RollbackTarget::Tag(tag) => filters.push(Box::new(AfterTagFilter::new(tag, &ran)?)),
                RollbackTarget::Date(date) => filters.push(Box::new(ExecutedAfterFilter::new(*date, &ran))),
            }
            let to_undo = ChangeLogIterator::reverse(executed, filters).accepted();

            let mut impossible = Vec::new();
            for change_set in &to_undo {
                match change_set.rollback_statements(&self.database) {
                    Ok(_) => {}
                    Err(MigrateError::RollbackImpossible(messages)) => impossible.extend(messages),
                    Err(e) => return Err(e),
                }
            }
            if !impossible.is_empty() {
                return Err(MigrateError::RollbackImpossible(impossible));
            }

            let ctx = self.run_context(session, &ran);
            let mut visitor = RollbackVisitor::new();
            ChangeLogIterator::new(to_undo, Vec::new())
                .run(&mut self.guarded(&mut visitor), &ctx)
                .await?;
            let summary = visitor.summary().clone();
            info!("Rollback complete: {}", summary);
            Ok(summary)
        })
        .await
    }

    /// Undo change sets back to `target`. Every change set that cannot be
    /// undone is reported before anything runs.
    pub async fn rollback(
        &self,
        target: RollbackTarget,
        contexts: &Contexts,
        labels: &LabelExpression,
    ) -> Result<RunSummary> {
        let session = self.session(false);
        self.run_rollback(&session, &target, contexts, labels).await
    }

    pub async fn rollback_sql(
        &self,
        target: RollbackTarget,
        contexts: &Contexts,
        labels: &LabelExpression,
        output: &mut dyn Write,
    ) -> Result<RunSummary> {
        let session = self.session(true);
        self.write_header(&session.executor, "Rollback Database Script");
        let summary = self.run_rollback(&session, &target, contexts, labels).await?;
        Self::flush(&session, output)?;
        Ok(summary)
    }

    async fn run_sync(&self, session: &Session, contexts: &Contexts, labels: &LabelExpression) -> Result<RunSummary> {
        self.locked(session, async {
            let (ran, _) = self.prepare(session, contexts, labels, false).await?;
            let ctx = self.run_context(session, &ran);
            let mut visitor = ChangeLogSyncVisitor::new();
            ChangeLogIterator::new(&self.change_log.change_sets, self.selection_filters(contexts, labels))
                .run(&mut self.guarded(&mut visitor), &ctx)
                .await?;
            let summary = visitor.summary().clone();
            info!("Change log sync complete: {}", summary);
            Ok(summary)
        })
        .await
    }

    /// Record every unrun change set as ran without executing it.
    pub async fn changelog_sync(&self, contexts: &Contexts, labels: &LabelExpression) -> Result<RunSummary> {
        let session = self.session(false);
        self.run_sync(&session, contexts, labels).await
    }

    pub async fn changelog_sync_sql(
        &self,
        contexts: &Contexts,
        labels: &LabelExpression,
        output: &mut dyn Write,
    ) -> Result<RunSummary> {
        let session = self.session(true);
        self.write_header(&session.executor, "Change Log Sync Script");
        let summary = self.run_sync(&session, contexts, labels).await?;
        Self::flush(&session, output)?;
        Ok(summary)
    }

    /// Tag the most recently executed change set.
    pub async fn tag(&self, tag: &str) -> Result<()> {
        let session = self.session(false);
        self.locked(&session, async {
            session.history.init().await?;
            session.history.tag(tag).await?;
            session.executor.commit().await?;
            info!("Tagged database with '{}'", tag);
            Ok(())
        })
        .await
    }

    pub async fn tag_exists(&self, tag: &str) -> Result<bool> {
        self.session(false).history.tag_exists(tag).await
    }

    /// Status of every change set. Changes nothing.
    pub async fn status(&self, contexts: &Contexts, labels: &LabelExpression) -> Result<Vec<ChangeSetStatus>> {
        let session = self.session(false);
        let ran = session.history.ran_change_sets().await?;
        let mut filters: Vec<Box<dyn ChangeSetFilter + '_>> =
            vec![Box::new(ShouldRunFilter::new(&ran, self.database.clone()))];
        filters.extend(self.selection_filters(contexts, labels));

        let ctx = self.run_context(&session, &ran);
        let mut visitor = StatusVisitor::new();
        ChangeLogIterator::new(&self.change_log.change_sets, filters)
            .run(&mut visitor, &ctx)
            .await?;
        Ok(visitor.into_statuses())
    }

    /// The recorded history in execution order.
    pub async fn history(&self) -> Result<Vec<RanChangeSet>> {
        self.session(false).history.ran_change_sets().await
    }

    /// Check the change log against the database, reporting every problem
    /// at once. Changes nothing.
    pub async fn validate(&self) -> Result<()> {
        let session = self.session(false);
        let ran = session.history.ran_change_sets().await?;
        let contexts = self.config.contexts(None);
        let labels = self.config.labels(None)?;

        let ctx = self.run_context(&session, &ran);
        let mut validator = ValidatingVisitor::new();
        validator.check_change_log_preconditions(&ctx).await?;
        ChangeLogIterator::new(&self.change_log.change_sets, self.selection_filters(&contexts, &labels))
            .run(&mut validator, &ctx)
            .await?;
        validator.result()?;
        info!("No validation errors found");
        Ok(())
    }

    pub async fn list_locks(&self) -> Result<Vec<LockRecord>> {
        self.session(false).lock.list_locks().await
    }

    /// Clear the lock whoever holds it.
    pub async fn force_release_locks(&self) -> Result<()> {
        self.session(false).lock.force_release_lock().await
    }

    /// Forget stored checksums so the next run recomputes them.
    pub async fn clear_checksums(&self) -> Result<()> {
        let session = self.session(false);
        self.locked(&session, async {
            session.history.init().await?;
            session.history.clear_checksums().await?;
            session.executor.commit().await?;
            info!("Cleared stored checksums");
            Ok(())
        })
        .await
    }

    /// Write `index.md` and `history.json` into `output_dir`.
    pub async fn generate_documentation(&self, output_dir: &Path) -> Result<()> {
        let statuses = self.status(&Contexts::default(), &LabelExpression::default()).await?;
        let history = self.history().await?;
        docs::write_documentation(self, &statuses, &history, output_dir)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::database::DatabaseKind;
    use crate::drivers::sqlite::SqliteConnection;
    use crate::precondition::{FailPolicy, Precondition, PreconditionContainer};
    use crate::statement::{
        ColumnConfig, CreateTableStatement, InsertStatement, RawSqlStatement, TableRef, TagDatabaseStatement,
    };
    use tempfile::tempdir;

    fn config() -> Config {
        let mut config = Config::for_url("sqlite::memory:").unwrap();
        config.run.host_identity = Some("test-host (127.0.0.1)".into());
        config.run.deployment_id = Some("0000000042".into());
        config
    }

    fn create_table(id: &str, table: &str) -> ChangeSet {
        ChangeSet::new(id, "bob", "db.yaml").with_statement(
            CreateTableStatement::new(table)
                .with_column(ColumnConfig::new("id", "int"))
                .with_column(ColumnConfig::new("name", "varchar(50)")),
        )
    }

    fn change_log() -> ChangeLog {
        ChangeLog::new("db.yaml")
            .with_change_set(create_table("1", "person"))
            .with_change_set(create_table("2", "address"))
            .with_change_set(create_table("3", "phone"))
    }

    fn migrator(connection: Arc<SqliteConnection>, config: Config, change_log: ChangeLog) -> Migrator {
        Migrator::new(Database::new(DatabaseKind::Sqlite), connection, config)
            .unwrap()
            .with_change_log(change_log)
    }

    fn none() -> (Contexts, LabelExpression) {
        (Contexts::default(), LabelExpression::default())
    }

    async fn table_count(connection: &SqliteConnection, table: &str) -> i64 {
        connection
            .query_scalar(&format!(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND lower(name) = lower('{}')",
                table
            ))
            .await
            .unwrap()
            .and_then(|v| v.as_i64())
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let migrator = migrator(connection.clone(), config(), change_log());
        let (contexts, labels) = none();

        let first = migrator.update(&contexts, &labels).await.unwrap();
        assert_eq!(first.executed.len(), 3);
        assert_eq!(table_count(&connection, "person").await, 1);

        let second = migrator.update(&contexts, &labels).await.unwrap();
        assert!(second.is_noop());

        let history = migrator.history().await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.deployment_id.as_deref() == Some("0000000042")));
        assert!(migrator.list_locks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_count_and_status() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let migrator = migrator(connection, config(), change_log());
        let (contexts, labels) = none();

        let summary = migrator.update_count(2, &contexts, &labels).await.unwrap();
        assert_eq!(summary.executed, vec!["db.yaml::1::bob", "db.yaml::2::bob"]);

        let statuses = migrator.status(&contexts, &labels).await.unwrap();
        let pending: Vec<_> = statuses.iter().filter(|s| s.will_run).map(|s| s.id.as_str()).collect();
        assert_eq!(pending, vec!["3"]);
        assert!(statuses.iter().all(|s| s.checksum_valid));
    }

    #[tokio::test]
    async fn test_failure_releases_lock_and_keeps_earlier_work() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let log = ChangeLog::new("db.yaml")
            .with_change_set(create_table("1", "person"))
            .with_change_set(ChangeSet::new("2", "bob", "db.yaml").with_statement(RawSqlStatement::new(
                "INSERT INTO no_such_table VALUES (1)",
            )));
        let migrator = migrator(connection, config(), log);
        let (contexts, labels) = none();

        match migrator.update(&contexts, &labels).await {
            Err(MigrateError::Execution { change_set, sql, .. }) => {
                assert_eq!(change_set, "db.yaml::2::bob");
                assert!(sql.contains("no_such_table"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(migrator.list_locks().await.unwrap().is_empty());
        assert_eq!(migrator.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lock_held_elsewhere_is_a_conflict() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let mut other = config();
        other.run.host_identity = Some("other-host".into());
        let holder = migrator(connection.clone(), other, change_log());
        let session = holder.session(false);
        assert!(session.lock.acquire_lock().await.unwrap());

        let migrator = migrator(connection, config(), change_log());
        let (contexts, labels) = none();
        let err = migrator.update(&contexts, &labels).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("other-host"));

        migrator.force_release_locks().await.unwrap();
        assert_eq!(migrator.update(&contexts, &labels).await.unwrap().executed.len(), 3);
    }

    #[tokio::test]
    async fn test_rollback_by_count_and_tag() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let migrator = migrator(connection.clone(), config(), change_log());
        let (contexts, labels) = none();

        migrator.update_count(1, &contexts, &labels).await.unwrap();
        migrator.tag("v1").await.unwrap();
        assert!(migrator.tag_exists("v1").await.unwrap());
        migrator.update(&contexts, &labels).await.unwrap();

        let summary = migrator
            .rollback(RollbackTarget::Count(1), &contexts, &labels)
            .await
            .unwrap();
        assert_eq!(summary.rolled_back, vec!["db.yaml::3::bob"]);
        assert_eq!(table_count(&connection, "phone").await, 0);

        let summary = migrator
            .rollback(RollbackTarget::Tag("v1".into()), &contexts, &labels)
            .await
            .unwrap();
        assert_eq!(summary.rolled_back, vec!["db.yaml::2::bob"]);
        assert_eq!(table_count(&connection, "address").await, 0);
        assert_eq!(table_count(&connection, "person").await, 1);
        assert_eq!(migrator.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_impossible_rollbacks_are_reported_together() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let log = ChangeLog::new("db.yaml")
            .with_change_set(ChangeSet::new("1", "bob", "db.yaml").with_statement(RawSqlStatement::new(
                "CREATE TABLE a (id INTEGER)",
            )))
            .with_change_set(ChangeSet::new("2", "bob", "db.yaml").with_statement(RawSqlStatement::new(
                "CREATE TABLE b (id INTEGER)",
            )));
        let migrator = migrator(connection.clone(), config(), log);
        let (contexts, labels) = none();
        migrator.update(&contexts, &labels).await.unwrap();

        match migrator.rollback(RollbackTarget::Count(2), &contexts, &labels).await {
            Err(MigrateError::RollbackImpossible(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(table_count(&connection, "a").await, 1);
        assert_eq!(migrator.history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_sql_writes_script_without_touching_database() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let migrator = migrator(connection.clone(), config(), change_log());
        let (contexts, labels) = none();

        let mut script = Vec::new();
        let summary = migrator.update_sql(&contexts, &labels, &mut script).await.unwrap();
        let script = String::from_utf8(script).unwrap();

        assert_eq!(summary.executed.len(), 3);
        assert!(script.contains("-- Update Database Script"));
        assert!(script.contains("-- Lock Database"));
        assert!(script.contains("-- Changeset db.yaml::1::bob"));
        assert!(script.contains("CREATE TABLE"));
        assert!(script.contains("DATABASECHANGELOG"));
        assert!(script.contains("-- Release Database Lock"));
        assert_eq!(table_count(&connection, "person").await, 0);
        assert_eq!(table_count(&connection, "DATABASECHANGELOG").await, 0);
    }

    #[tokio::test]
    async fn test_checksum_drift_blocks_update() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let (contexts, labels) = none();
        migrator(connection.clone(), config(), change_log())
            .update(&contexts, &labels)
            .await
            .unwrap();

        let mut edited = change_log();
        edited.change_sets[0] = create_table("1", "people");
        let migrator = migrator(connection, config(), edited);
        match migrator.update(&contexts, &labels).await {
            Err(MigrateError::ChecksumMismatch(messages)) => {
                assert_eq!(messages.len(), 1);
                assert!(messages[0].starts_with("db.yaml::1::bob was: 9:"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(migrator.validate().await.is_err());

        migrator.clear_checksums().await.unwrap();
        assert!(migrator.validate().await.is_ok());
    }

    #[tokio::test]
    async fn test_change_log_sync_and_tag_on_update() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let mut tagged = config();
        tagged.run.tag_on_update = Some("release-1".into());
        let migrator = migrator(connection.clone(), tagged, change_log());
        let (contexts, labels) = none();

        let summary = migrator.changelog_sync(&contexts, &labels).await.unwrap();
        assert_eq!(summary.marked_ran.len(), 3);
        assert_eq!(table_count(&connection, "person").await, 0);

        assert!(migrator.update(&contexts, &labels).await.unwrap().is_noop());
        assert!(migrator.tag_exists("release-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_to_tag_stops_after_tagging_change_set() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let log = ChangeLog::new("db.yaml")
            .with_change_set(create_table("1", "person"))
            .with_change_set(ChangeSet::new("2", "bob", "db.yaml").with_statement(TagDatabaseStatement {
                table: TableRef::new("DATABASECHANGELOG"),
                tag: "v1".into(),
            }))
            .with_change_set(create_table("3", "phone"));
        let migrator = migrator(connection.clone(), config(), log);
        let (contexts, labels) = none();

        let summary = migrator.update_to_tag("v1", &contexts, &labels).await.unwrap();
        assert_eq!(summary.executed.len(), 2);
        assert_eq!(table_count(&connection, "phone").await, 0);
        assert!(migrator.update_to_tag("v9", &contexts, &labels).await.is_err());
    }

    #[tokio::test]
    async fn test_change_log_precondition_halt_fails_validation() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let mut log = change_log();
        log.preconditions = Some(
            PreconditionContainer::new(vec![Precondition::DbmsType {
                dbms: crate::changelog::DbmsSet::parse("oracle").unwrap(),
            }])
            .on_fail(FailPolicy::Halt),
        );
        let migrator = migrator(connection.clone(), config(), log);
        let (contexts, labels) = none();

        assert!(matches!(
            migrator.update(&contexts, &labels).await,
            Err(MigrateError::Validation(_))
        ));
        assert_eq!(table_count(&connection, "person").await, 0);
    }

    #[tokio::test]
    async fn test_file_history_backend() {
        let dir = tempdir().unwrap();
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let mut file_config = config();
        file_config.changelog.history_file = Some(dir.path().join("history.json"));
        let log = ChangeLog::new("db.yaml").with_change_set(
            ChangeSet::new("1", "bob", "db.yaml")
                .with_statement(CreateTableStatement::new("person").with_column(ColumnConfig::new("id", "int")))
                .with_statement(InsertStatement::new("person").with_value("id", 1i64)),
        );
        let migrator = migrator(connection.clone(), file_config, log);
        let (contexts, labels) = none();

        migrator.update(&contexts, &labels).await.unwrap();
        assert!(dir.path().join("history.json").exists());
        assert_eq!(table_count(&connection, "DATABASECHANGELOG").await, 0);
        assert_eq!(migrator.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_documentation() {
        let dir = tempdir().unwrap();
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let migrator = migrator(connection, config(), change_log());
        let (contexts, labels) = none();
        migrator.update_count(1, &contexts, &labels).await.unwrap();

        migrator.generate_documentation(dir.path()).await.unwrap();
        let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("db.yaml::1::bob"));
        assert!(index.contains("postgresql"));
        let history: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("history.json")).unwrap()).unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_change_sets() {
        let connection = Arc::new(SqliteConnection::open_in_memory().unwrap());
        let (sender, receiver) = watch::channel(true);
        let migrator = migrator(connection, config(), change_log()).with_cancel(receiver);
        let (contexts, labels) = none();

        assert!(matches!(
            migrator.update(&contexts, &labels).await,
            Err(MigrateError::Cancelled)
        ));
        assert!(migrator.list_locks().await.unwrap().is_empty());
        drop(sender);
    }
}
