//! What a run does with each change set the iterator hands it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info, warn};

use super::{ChangeLog, ChangeSet, CheckSum, ChecksumVersion, ExecType, RanChangeSet};
use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::executor::Executor;
use crate::generator::{GeneratorRegistry, ValidationErrors};
use crate::history::HistoryService;
use crate::precondition::{PreconditionAction, PreconditionContext};
use crate::statement::ChangeSetKey;

/// Everything a visitor needs for one run.
pub struct RunContext<'a> {
    pub executor: &'a Executor,
    pub history: &'a dyn HistoryService,
    pub change_log: &'a ChangeLog,
    /// History as read at the start of the run.
    pub ran: &'a [RanChangeSet],
    pub checksum_version: ChecksumVersion,
}

impl<'a> RunContext<'a> {
    pub fn database(&self) -> &'a Database {
        self.executor.database()
    }

    pub fn registry(&self) -> &'a GeneratorRegistry {
        self.executor.registry()
    }

    /// The history row of a change set, ignoring FAILED attempts.
    pub fn ran_entry(&self, change_set: &ChangeSet) -> Option<&'a RanChangeSet> {
        self.ran
            .iter()
            .find(|r| r.is_for(change_set) && r.exec_type.counts_as_ran())
    }

    pub fn precondition_context(&self, change_set: Option<&'a ChangeSet>) -> PreconditionContext<'a> {
        PreconditionContext {
            connection: self.executor.connection(),
            database: self.executor.database(),
            change_log: self.change_log,
            ran_change_sets: self.ran,
            change_set,
        }
    }
}

/// Change sets touched by a run, by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    pub marked_ran: Vec<String>,
    pub failed: Vec<String>,
    pub rolled_back: Vec<String>,
    /// Not yet run (status and validation runs).
    pub pending: Vec<String>,
}

impl RunSummary {
    /// Whether the run changed anything.
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty() && self.marked_ran.is_empty() && self.failed.is_empty() && self.rolled_back.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} executed, {} skipped, {} marked ran, {} failed, {} rolled back",
            self.executed.len(),
            self.skipped.len(),
            self.marked_ran.len(),
            self.failed.len(),
            self.rolled_back.len()
        )
    }
}

#[async_trait]
pub trait ChangeSetVisitor: Send {
    /// Called for every change set the filters accept.
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()>;

    /// Called for every change set a filter rejected.
    async fn skipped(&mut self, _change_set: &ChangeSet, _reasons: &[String], _ctx: &RunContext<'_>) -> Result<()> {
        Ok(())
    }

    fn summary(&self) -> &RunSummary;
}

fn in_change_set(error: MigrateError, name: &str) -> MigrateError {
    match error {
        MigrateError::Execution {
            change_set,
            sql,
            message,
            source,
        } if change_set.is_empty() => MigrateError::Execution {
            change_set: name.to_string(),
            sql,
            message,
            source,
        },
        other => other,
    }
}

/// Open the per-change-set transaction bracket. Returns whether it is
/// transactional.
async fn begin(ctx: &RunContext<'_>, change_set: &ChangeSet) -> Result<bool> {
    let transactional = ctx.database().capabilities().supports_ddl_in_transaction && change_set.run_in_transaction;
    ctx.executor.set_auto_commit(!transactional).await?;
    Ok(transactional)
}

async fn abort(ctx: &RunContext<'_>, change_set: &ChangeSet, transactional: bool) {
    if transactional {
        if let Err(e) = ctx.executor.rollback().await {
            warn!("Rollback after failure of {} failed: {}", change_set, e);
        }
    } else {
        warn!(
            "{} failed without a transaction on {}; its statements may be partially applied",
            change_set,
            ctx.database()
        );
    }
}

async fn execute_statements(change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
    for statement in change_set.statements_for(ctx.database()) {
        for warning in ctx.registry().warnings(statement, ctx.database()) {
            warn!("{}: {}", change_set, warning);
        }
        ctx.executor.execute(statement).await?;
    }
    Ok(())
}

/// Executes change sets and records them in the history.
#[derive(Debug, Default)]
pub struct UpdateVisitor {
    summary: RunSummary,
}

impl UpdateVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    async fn apply(
        change_set: &ChangeSet,
        exec_type: ExecType,
        checksum: &CheckSum,
        ctx: &RunContext<'_>,
    ) -> Result<()> {
        execute_statements(change_set, ctx).await?;
        ctx.history.set_exec_type(change_set, exec_type, Some(checksum)).await
    }
}

#[async_trait]
impl ChangeSetVisitor for UpdateVisitor {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        let name = change_set.to_string();
        ctx.executor.comment(&format!("Changeset {}", name));
        let checksum = change_set.generate_checksum(ctx.checksum_version, ctx.database())?;

        if let Some(preconditions) = &change_set.preconditions {
            let pctx = ctx.precondition_context(Some(change_set));
            match preconditions.evaluate(&pctx, &name, ctx.executor.is_output()).await? {
                PreconditionAction::Run => {}
                PreconditionAction::Skip(_) => {
                    self.summary.skipped.push(name);
                    return Ok(());
                }
                PreconditionAction::MarkRan(_) => {
                    ctx.history
                        .set_exec_type(change_set, ExecType::MarkRan, Some(&checksum))
                        .await?;
                    ctx.executor.commit().await?;
                    self.summary.marked_ran.push(name);
                    return Ok(());
                }
            }
        }

        let exec_type = if ctx.ran_entry(change_set).is_some() {
            ExecType::Reran
        } else {
            ExecType::Executed
        };
        let transactional = begin(ctx, change_set).await?;
        match Self::apply(change_set, exec_type, &checksum, ctx).await {
            Ok(()) => {
                if transactional {
                    ctx.executor.commit().await?;
                }
                info!("ChangeSet {} ran successfully ({})", name, exec_type);
                self.summary.executed.push(name);
                Ok(())
            }
            Err(e) => {
                abort(ctx, change_set, transactional).await;
                error!("ChangeSet {} failed: {}", name, e);
                if change_set.fail_on_error || matches!(e, MigrateError::Cancelled) {
                    return Err(in_change_set(e, &name));
                }
                ctx.history
                    .set_exec_type(change_set, ExecType::Failed, Some(&checksum))
                    .await?;
                if transactional {
                    ctx.executor.commit().await?;
                }
                self.summary.failed.push(name);
                Ok(())
            }
        }
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// Undoes change sets and removes them from the history.
#[derive(Debug, Default)]
pub struct RollbackVisitor {
    summary: RunSummary,
}

impl RollbackVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeSetVisitor for RollbackVisitor {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        let name = change_set.to_string();
        ctx.executor.comment(&format!("Rolling Back ChangeSet: {}", name));
        let statements = change_set.rollback_statements(ctx.database())?;

        let transactional = begin(ctx, change_set).await?;
        let mut result = Ok(());
        for statement in &statements {
            if let Err(e) = ctx.executor.execute(statement).await {
                result = Err(e);
                break;
            }
        }
        if result.is_ok() {
            result = ctx.history.remove_from_history(change_set).await;
        }

        match result {
            Ok(()) => {
                if transactional {
                    ctx.executor.commit().await?;
                }
                info!("Rolled back ChangeSet {}", name);
                self.summary.rolled_back.push(name);
                Ok(())
            }
            Err(e) => {
                abort(ctx, change_set, transactional).await;
                error!("Rollback of {} failed: {}", name, e);
                Err(in_change_set(e, &name))
            }
        }
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// Records change sets as ran without executing them.
#[derive(Debug, Default)]
pub struct ChangeLogSyncVisitor {
    summary: RunSummary,
}

impl ChangeLogSyncVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeSetVisitor for ChangeLogSyncVisitor {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        if ctx.ran_entry(change_set).is_some() {
            return Ok(());
        }
        let checksum = change_set.generate_checksum(ctx.checksum_version, ctx.database())?;
        ctx.history
            .set_exec_type(change_set, ExecType::MarkRan, Some(&checksum))
            .await?;
        ctx.executor.commit().await?;
        self.summary.marked_ran.push(change_set.to_string());
        Ok(())
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// One change set as seen by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSetStatus {
    pub change_set: String,
    pub id: String,
    pub author: String,
    pub file_path: String,
    pub description: String,
    pub will_run: bool,
    pub previously_ran: bool,
    pub date_last_executed: Option<DateTime<Utc>>,
    pub last_exec_type: Option<ExecType>,
    pub stored_checksum: Option<String>,
    pub current_checksum: String,
    pub checksum_valid: bool,
    pub reasons: Vec<String>,
}

/// Collects a [`ChangeSetStatus`] for every change set without changing
/// anything.
#[derive(Debug, Default)]
pub struct StatusVisitor {
    statuses: Vec<ChangeSetStatus>,
    summary: RunSummary,
}

impl StatusVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> &[ChangeSetStatus] {
        &self.statuses
    }

    pub fn into_statuses(self) -> Vec<ChangeSetStatus> {
        self.statuses
    }

    fn record(&mut self, change_set: &ChangeSet, will_run: bool, reasons: &[String], ctx: &RunContext<'_>) -> Result<()> {
        let ran = ctx.ran.iter().find(|r| r.is_for(change_set));
        let stored = ran.and_then(|r| r.last_checksum.clone());
        let status = ChangeSetStatus {
            change_set: change_set.to_string(),
            id: change_set.id.clone(),
            author: change_set.author.clone(),
            file_path: change_set.file_path.clone(),
            description: change_set.description(),
            will_run,
            previously_ran: ran.is_some_and(|r| r.exec_type.counts_as_ran()),
            date_last_executed: ran.and_then(|r| r.date_executed),
            last_exec_type: ran.map(|r| r.exec_type),
            checksum_valid: change_set.is_checksum_valid(stored.as_deref(), ctx.database()),
            stored_checksum: stored,
            current_checksum: change_set
                .generate_checksum(ctx.checksum_version, ctx.database())?
                .to_string(),
            reasons: reasons.to_vec(),
        };
        if will_run {
            self.summary.pending.push(status.change_set.clone());
        } else {
            self.summary.skipped.push(status.change_set.clone());
        }
        self.statuses.push(status);
        Ok(())
    }
}

#[async_trait]
impl ChangeSetVisitor for StatusVisitor {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        self.record(change_set, true, &[], ctx)
    }

    async fn skipped(&mut self, change_set: &ChangeSet, reasons: &[String], ctx: &RunContext<'_>) -> Result<()> {
        self.record(change_set, false, reasons, ctx)
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// Checks a change log against the database before anything runs.
///
/// Collects every problem instead of stopping at the first:
/// checksum drift on ran change sets, generator validation errors and
/// unsupported statements on change sets that will run, duplicate
/// identities, and failed change log preconditions. With
/// `upgrade_checksums` set, stored checksums that are missing or from an
/// older compatible version are rewritten in place.
#[derive(Debug, Default)]
pub struct ValidatingVisitor {
    upgrade_checksums: bool,
    seen: HashSet<ChangeSetKey>,
    errors: Vec<String>,
    checksum_mismatches: Vec<String>,
    upgraded: Vec<String>,
    summary: RunSummary,
}

impl ValidatingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade_checksums(mut self, upgrade: bool) -> Self {
        self.upgrade_checksums = upgrade;
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn checksum_mismatches(&self) -> &[String] {
        &self.checksum_mismatches
    }

    /// Change sets whose stored checksum was rewritten.
    pub fn upgraded(&self) -> &[String] {
        &self.upgraded
    }

    /// Evaluate the change log's own preconditions. HALT failures are
    /// collected as errors and reported as a skip.
    pub async fn check_change_log_preconditions(&mut self, ctx: &RunContext<'_>) -> Result<PreconditionAction> {
        let Some(preconditions) = &ctx.change_log.preconditions else {
            return Ok(PreconditionAction::Run);
        };
        let owner = ctx.change_log.file_path.as_str();
        let pctx = ctx.precondition_context(None);
        match preconditions.evaluate(&pctx, owner, ctx.executor.is_output()).await {
            Ok(action) => Ok(action),
            Err(MigrateError::PreconditionFailed { messages, .. }) => {
                let reason = messages.join("; ");
                self.errors
                    .extend(messages.into_iter().map(|m| format!("{}: precondition failed: {}", owner, m)));
                Ok(PreconditionAction::Skip(reason))
            }
            Err(MigrateError::PreconditionErrored { message, .. }) => {
                self.errors.push(format!("{}: precondition errored: {}", owner, message));
                Ok(PreconditionAction::Skip(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Everything found, as one error.
    pub fn result(&self) -> Result<()> {
        if self.errors.is_empty() && self.checksum_mismatches.is_empty() {
            return Ok(());
        }
        if self.errors.is_empty() {
            return Err(MigrateError::ChecksumMismatch(self.checksum_mismatches.clone()));
        }
        let mut errors = ValidationErrors::new();
        for message in self.errors.iter().chain(&self.checksum_mismatches) {
            errors.add_error(message.clone());
        }
        Err(MigrateError::Validation(errors))
    }

    fn check_attributes(&mut self, change_set: &ChangeSet) -> bool {
        let id_empty = change_set.id.trim().is_empty();
        let author_empty = change_set.author.trim().is_empty();
        let problem = match (id_empty, author_empty) {
            (true, true) => "ChangeSet Id and Author are empty",
            (true, false) => "ChangeSet Id is empty",
            (false, true) => "ChangeSet Author is empty",
            (false, false) => return true,
        };
        self.errors.push(format!("{}: {}", change_set, problem));
        false
    }

    fn check_statements(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) {
        let database = ctx.database();
        for statement in change_set.statements_for(database) {
            if !ctx.registry().supports(statement, database) {
                self.errors.push(format!(
                    "{}: {} is not supported on {}",
                    change_set,
                    statement.kind(),
                    database.short_name()
                ));
                continue;
            }
            let found = ctx.registry().validate(statement, database);
            for message in found.errors() {
                self.errors.push(format!("{}: {}", change_set, message));
            }
            for message in found.warnings() {
                warn!("{}: {}", change_set, message);
            }
        }
    }

    async fn check_checksum(&mut self, change_set: &ChangeSet, ran: &RanChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        let database = ctx.database();
        let stored = ran.last_checksum.as_deref();
        let current = change_set.generate_checksum(ctx.checksum_version, database)?;

        let Some(stored) = stored else {
            if self.upgrade_checksums {
                ctx.history.replace_checksum(&ran.key, &current).await?;
                self.upgraded.push(change_set.to_string());
            }
            return Ok(());
        };

        let parsed = stored.parse::<CheckSum>().ok();
        if change_set.is_checksum_valid(Some(stored), database) {
            let upgradable = parsed.as_ref().is_some_and(|p| {
                p.version() < ctx.checksum_version && p.version().upgrades_to(ctx.checksum_version)
            });
            if self.upgrade_checksums && upgradable && !change_set.is_whitelisted(stored) {
                warn!("Upgrading checksum of {} from {} to {}", change_set, stored, current);
                ctx.history.replace_checksum(&ran.key, &current).await?;
                self.upgraded.push(change_set.to_string());
            }
        } else if !change_set.run_on_change && !change_set.run_always {
            let now = match &parsed {
                Some(p) => change_set.generate_checksum(p.version(), database)?,
                None => current,
            };
            self.checksum_mismatches
                .push(format!("{} was: {} but is now: {}", change_set, stored, now));
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeSetVisitor for ValidatingVisitor {
    async fn visit(&mut self, change_set: &ChangeSet, ctx: &RunContext<'_>) -> Result<()> {
        if !self.seen.insert(change_set.key()) {
            self.errors.push(format!("Duplicate change set {}", change_set));
            return Ok(());
        }
        let ran = ctx.ran_entry(change_set);
        let valid_attributes = self.check_attributes(change_set);
        let should_validate = ran.is_none() || change_set.run_on_change || change_set.run_always;
        if valid_attributes && should_validate {
            self.check_statements(change_set, ctx);
        }
        match ran {
            Some(ran) => self.check_checksum(change_set, ran, ctx).await?,
            None => self.summary.pending.push(change_set.to_string()),
        }
        Ok(())
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::{ChangeLogIterator, ShouldRunFilter};
    use crate::database::DatabaseKind;
    use crate::history::FileHistoryService;
    use crate::precondition::{FailPolicy, Precondition, PreconditionContainer};
    use crate::statement::{ColumnConfig, CreateTableStatement, RawSqlStatement};
    use crate::testing::MockConnection;
    use std::sync::Arc;

    struct Fixture {
        connection: Arc<MockConnection>,
        executor: Executor,
        history: FileHistoryService,
    }

    impl Fixture {
        fn new(connection: MockConnection) -> Self {
            let connection = Arc::new(connection);
            let executor = Executor::live(
                connection.clone(),
                Database::new(DatabaseKind::Postgres),
                Arc::new(GeneratorRegistry::with_builtins()),
            );
            Self {
                connection,
                executor,
                history: FileHistoryService::new("unused.json", "0000000001".into()).dry_run(true),
            }
        }

        async fn run(&self, change_log: &ChangeLog, visitor: &mut dyn ChangeSetVisitor) -> Result<()> {
            let ran = self.history.ran_change_sets().await?;
            let ctx = RunContext {
                executor: &self.executor,
                history: &self.history,
                change_log,
                ran: &ran,
                checksum_version: ChecksumVersion::CURRENT,
            };
            let filters: Vec<Box<dyn crate::changelog::ChangeSetFilter>> =
                vec![Box::new(ShouldRunFilter::new(&ran, self.executor.database().clone()))];
            ChangeLogIterator::new(&change_log.change_sets, filters).run(visitor, &ctx).await
        }
    }

    fn raw(id: &str, sql: &str) -> ChangeSet {
        ChangeSet::new(id, "bob", "db.yaml").with_statement(RawSqlStatement::new(sql))
    }

    #[tokio::test]
    async fn test_update_runs_once_and_commits() {
        let fixture = Fixture::new(MockConnection::new());
        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(raw("1", "CREATE TABLE a (id int)"))
            .with_change_set(raw("2", "CREATE TABLE b (id int)"));

        let mut first = UpdateVisitor::new();
        fixture.run(&change_log, &mut first).await.unwrap();
        assert_eq!(first.summary().executed.len(), 2);
        assert_eq!(fixture.connection.commits(), 2);

        let mut second = UpdateVisitor::new();
        fixture.run(&change_log, &mut second).await.unwrap();
        assert!(second.summary().is_noop());
        assert_eq!(fixture.connection.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_halts_with_change_set_name() {
        let fixture = Fixture::new(MockConnection::new());
        fixture.connection.fail_on("CREATE TABLE b (id int)", "syntax error");
        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(raw("1", "CREATE TABLE a (id int)"))
            .with_change_set(raw("2", "CREATE TABLE b (id int)"))
            .with_change_set(raw("3", "CREATE TABLE c (id int)"));

        let mut visitor = UpdateVisitor::new();
        match fixture.run(&change_log, &mut visitor).await {
            Err(MigrateError::Execution { change_set, .. }) => assert_eq!(change_set, "db.yaml::2::bob"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fixture.connection.rollbacks(), 1);
        let ran = fixture.history.ran_change_sets().await.unwrap();
        assert_eq!(ran.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_error_false_records_failed_and_continues() {
        let fixture = Fixture::new(MockConnection::new());
        fixture.connection.fail_on("CREATE TABLE b (id int)", "syntax error");
        let mut lenient = raw("2", "CREATE TABLE b (id int)");
        lenient.fail_on_error = false;
        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(lenient)
            .with_change_set(raw("3", "CREATE TABLE c (id int)"));

        let mut visitor = UpdateVisitor::new();
        fixture.run(&change_log, &mut visitor).await.unwrap();
        assert_eq!(visitor.summary().failed, vec!["db.yaml::2::bob".to_string()]);
        assert_eq!(visitor.summary().executed, vec!["db.yaml::3::bob".to_string()]);
        let ran = fixture.history.ran_change_sets().await.unwrap();
        assert_eq!(ran[0].exec_type, ExecType::Failed);
    }

    #[tokio::test]
    async fn test_precondition_policies() {
        let fixture = Fixture::new(MockConnection::new().with_scalar("SELECT 1", 0i64));
        let check = || Precondition::SqlCheck {
            sql: "SELECT 1".into(),
            expected_result: "1".into(),
        };
        let mut skipped = raw("1", "CREATE TABLE a (id int)");
        skipped.preconditions = Some(PreconditionContainer::new(vec![check()]).on_fail(FailPolicy::Continue));
        let mut marked = raw("2", "CREATE TABLE b (id int)");
        marked.preconditions = Some(PreconditionContainer::new(vec![check()]).on_fail(FailPolicy::MarkRan));
        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(skipped)
            .with_change_set(marked);

        let mut visitor = UpdateVisitor::new();
        fixture.run(&change_log, &mut visitor).await.unwrap();
        assert_eq!(visitor.summary().skipped.len(), 1);
        assert_eq!(visitor.summary().marked_ran.len(), 1);
        assert!(fixture.connection.executed().is_empty());

        let ran = fixture.history.ran_change_sets().await.unwrap();
        assert_eq!(ran.len(), 1);
        assert_eq!(ran[0].exec_type, ExecType::MarkRan);
    }

    #[tokio::test]
    async fn test_rollback_uses_inverse_and_clears_history() {
        let fixture = Fixture::new(MockConnection::new());
        let change_set = ChangeSet::new("1", "bob", "db.yaml")
            .with_statement(CreateTableStatement::new("person").with_column(ColumnConfig::new("id", "int")));
        let change_log = ChangeLog::new("db.yaml").with_change_set(change_set);
        fixture.run(&change_log, &mut UpdateVisitor::new()).await.unwrap();

        let ran = fixture.history.ran_change_sets().await.unwrap();
        let ctx = RunContext {
            executor: &fixture.executor,
            history: &fixture.history,
            change_log: &change_log,
            ran: &ran,
            checksum_version: ChecksumVersion::CURRENT,
        };
        let mut visitor = RollbackVisitor::new();
        ChangeLogIterator::reverse(&change_log.change_sets, Vec::new())
            .run(&mut visitor, &ctx)
            .await
            .unwrap();

        assert_eq!(visitor.summary().rolled_back.len(), 1);
        assert!(fixture.connection.executed().last().unwrap().to_uppercase().starts_with("DROP TABLE"));
        assert!(fixture.history.ran_change_sets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_marks_without_executing() {
        let fixture = Fixture::new(MockConnection::new());
        let change_log = ChangeLog::new("db.yaml").with_change_set(raw("1", "CREATE TABLE a (id int)"));
        let mut visitor = ChangeLogSyncVisitor::new();
        fixture.run(&change_log, &mut visitor).await.unwrap();
        assert_eq!(visitor.summary().marked_ran.len(), 1);
        assert!(fixture.connection.executed().is_empty());
        assert_eq!(
            fixture.history.ran_change_sets().await.unwrap()[0].exec_type,
            ExecType::MarkRan
        );
    }

    #[tokio::test]
    async fn test_validation_detects_drift_and_upgrades_compatible_checksums() {
        let fixture = Fixture::new(MockConnection::new());
        let database = Database::new(DatabaseKind::Postgres);
        let drifted = raw("1", "CREATE TABLE a (id int)");
        let upgradable = raw("2", "CREATE TABLE b (id int)");

        let old = upgradable.generate_checksum(ChecksumVersion::V8, &database).unwrap();
        fixture.history.set_exec_type(&upgradable, ExecType::Executed, Some(&old)).await.unwrap();
        let stale = CheckSum::compute("something else", ChecksumVersion::V9);
        fixture.history.set_exec_type(&drifted, ExecType::Executed, Some(&stale)).await.unwrap();

        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(drifted)
            .with_change_set(upgradable.clone());
        let ran = fixture.history.ran_change_sets().await.unwrap();
        let ctx = RunContext {
            executor: &fixture.executor,
            history: &fixture.history,
            change_log: &change_log,
            ran: &ran,
            checksum_version: ChecksumVersion::CURRENT,
        };
        let mut visitor = ValidatingVisitor::new().upgrade_checksums(true);
        ChangeLogIterator::new(&change_log.change_sets, Vec::new())
            .run(&mut visitor, &ctx)
            .await
            .unwrap();

        assert_eq!(visitor.checksum_mismatches().len(), 1);
        assert!(visitor.checksum_mismatches()[0].starts_with("db.yaml::1::bob was: 9:"));
        assert_eq!(visitor.upgraded(), &["db.yaml::2::bob".to_string()]);
        assert!(matches!(visitor.result(), Err(MigrateError::ChecksumMismatch(_))));

        let after = fixture.history.ran_change_sets().await.unwrap();
        let row = after.iter().find(|r| r.key.id == "2").unwrap();
        let expected = upgradable.generate_checksum(ChecksumVersion::V9, &database).unwrap();
        assert_eq!(row.last_checksum.as_deref(), Some(expected.to_string().as_str()));
        assert_eq!(row.exec_type, ExecType::Executed);
    }

    #[tokio::test]
    async fn test_status_reports_pending_and_ran() {
        let fixture = Fixture::new(MockConnection::new());
        let first = raw("1", "CREATE TABLE a (id int)");
        let sum = first.generate_checksum(ChecksumVersion::CURRENT, fixture.executor.database()).unwrap();
        fixture.history.set_exec_type(&first, ExecType::Executed, Some(&sum)).await.unwrap();
        let change_log = ChangeLog::new("db.yaml")
            .with_change_set(first)
            .with_change_set(raw("2", "CREATE TABLE b (id int)"));

        let mut visitor = StatusVisitor::new();
        fixture.run(&change_log, &mut visitor).await.unwrap();
        let statuses = visitor.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(!statuses[0].will_run);
        assert!(statuses[0].previously_ran);
        assert!(statuses[0].checksum_valid);
        assert_eq!(statuses[0].reasons, vec!["Change set already ran".to_string()]);
        assert!(statuses[1].will_run);
        assert_eq!(visitor.summary().pending, vec!["db.yaml::2::bob".to_string()]);
    }
}
