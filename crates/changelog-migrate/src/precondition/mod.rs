//! Preconditions gating change sets and whole change logs.
//!
//! A [`Precondition`] evaluates to a [`PreconditionOutcome`]: passed, failed
//! (the assertion did not hold) or errored (it could not be evaluated). A
//! [`PreconditionContainer`] wraps a list of preconditions together with the
//! policies that decide what a failure or error means for the run.

pub(crate) mod catalog;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};

use crate::changelog::{ChangeLog, ChangeSet, DbmsSet, RanChangeSet};
use crate::core::Connection;
use crate::database::Database;
use crate::error::{MigrateError, Result};

use catalog::{column_exists, object_exists, CatalogObject};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of evaluating a precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionOutcome {
    Passed,
    Failed(String),
    Errored(String),
}

impl PreconditionOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, PreconditionOutcome::Passed)
    }

    fn from_check(passed: bool, message: impl FnOnce() -> String) -> Self {
        if passed {
            PreconditionOutcome::Passed
        } else {
            PreconditionOutcome::Failed(message())
        }
    }
}

/// Everything a precondition may look at.
pub struct PreconditionContext<'a> {
    pub connection: &'a dyn Connection,
    pub database: &'a Database,
    pub change_log: &'a ChangeLog,
    pub ran_change_sets: &'a [RanChangeSet],
    pub change_set: Option<&'a ChangeSet>,
}

/// A node of the precondition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Precondition {
    /// Every child passes.
    And { preconditions: Vec<Precondition> },
    /// At least one child passes.
    Or { preconditions: Vec<Precondition> },
    /// No child passes.
    Not { preconditions: Vec<Precondition> },
    TableExists {
        #[serde(default)]
        schema_name: Option<String>,
        table_name: String,
    },
    ColumnExists {
        #[serde(default)]
        schema_name: Option<String>,
        table_name: String,
        column_name: String,
    },
    ViewExists {
        #[serde(default)]
        schema_name: Option<String>,
        view_name: String,
    },
    SequenceExists {
        #[serde(default)]
        schema_name: Option<String>,
        sequence_name: String,
    },
    RowCount {
        #[serde(default)]
        schema_name: Option<String>,
        table_name: String,
        expected_rows: i64,
    },
    TableIsEmpty {
        #[serde(default)]
        schema_name: Option<String>,
        table_name: String,
    },
    /// The first column of the first row equals `expected_result`.
    SqlCheck { sql: String, expected_result: String },
    #[serde(rename = "dbms")]
    DbmsType { dbms: DbmsSet },
    RunningAs { username: String },
    ChangeSetExecuted {
        id: String,
        author: String,
        #[serde(default)]
        file_path: Option<String>,
    },
    ChangeLogPropertyDefined {
        property: String,
        #[serde(default)]
        value: Option<String>,
    },
}

impl Precondition {
    /// Evaluate this node and, for composites, its children.
    pub fn check<'a>(&'a self, ctx: &'a PreconditionContext<'a>) -> BoxFuture<'a, PreconditionOutcome> {
        Box::pin(async move {
            match self {
                Precondition::And { preconditions } => check_all(preconditions, ctx).await,
                Precondition::Or { preconditions } => {
                    let mut failures = Vec::new();
                    for child in preconditions {
                        match child.check(ctx).await {
                            PreconditionOutcome::Passed => return PreconditionOutcome::Passed,
                            PreconditionOutcome::Failed(message) => failures.push(message),
                            // An error aborts the OR even if a later child would pass.
                            errored => return errored,
                        }
                    }
                    if failures.is_empty() {
                        PreconditionOutcome::Passed
                    } else {
                        PreconditionOutcome::Failed(failures.join("; "))
                    }
                }
                Precondition::Not { preconditions } => {
                    for child in preconditions {
                        match child.check(ctx).await {
                            PreconditionOutcome::Passed => {
                                return PreconditionOutcome::Failed(format!("Not precondition failed: {} passed", child))
                            }
                            PreconditionOutcome::Failed(_) => {}
                            errored => return errored,
                        }
                    }
                    PreconditionOutcome::Passed
                }
                leaf => match leaf.check_leaf(ctx).await {
                    Ok(outcome) => outcome,
                    Err(e) => PreconditionOutcome::Errored(e.to_string()),
                },
            }
        })
    }

    async fn check_leaf(&self, ctx: &PreconditionContext<'_>) -> Result<PreconditionOutcome> {
        let db = ctx.database;
        let conn = ctx.connection;
        let outcome = match self {
            Precondition::TableExists {
                schema_name,
                table_name,
            } => PreconditionOutcome::from_check(
                object_exists(conn, db, CatalogObject::Table, schema_name.as_deref(), table_name).await?,
                || format!("Table {} does not exist", table_name),
            ),
            Precondition::ViewExists { schema_name, view_name } => PreconditionOutcome::from_check(
                object_exists(conn, db, CatalogObject::View, schema_name.as_deref(), view_name).await?,
                || format!("View {} does not exist", view_name),
            ),
            Precondition::SequenceExists {
                schema_name,
                sequence_name,
            } => PreconditionOutcome::from_check(
                object_exists(conn, db, CatalogObject::Sequence, schema_name.as_deref(), sequence_name).await?,
                || format!("Sequence {} does not exist", sequence_name),
            ),
            Precondition::ColumnExists {
                schema_name,
                table_name,
                column_name,
            } => PreconditionOutcome::from_check(
                column_exists(conn, db, schema_name.as_deref(), table_name, column_name).await?,
                || format!("Column {}.{} does not exist", table_name, column_name),
            ),
            Precondition::RowCount {
                schema_name,
                table_name,
                expected_rows,
            } => {
                let rows = row_count(ctx, schema_name.as_deref(), table_name).await?;
                PreconditionOutcome::from_check(rows == *expected_rows, || {
                    format!(
                        "Table {} does not have the expected row count of {}. It contains {} rows",
                        table_name, expected_rows, rows
                    )
                })
            }
            Precondition::TableIsEmpty {
                schema_name,
                table_name,
            } => {
                let rows = row_count(ctx, schema_name.as_deref(), table_name).await?;
                PreconditionOutcome::from_check(rows == 0, || {
                    format!("Table {} is not empty. It contains {} rows", table_name, rows)
                })
            }
            Precondition::SqlCheck { sql, expected_result } => {
                let actual = conn
                    .query_scalar(sql)
                    .await?
                    .and_then(|v| v.as_text())
                    .unwrap_or_else(|| "null".to_string());
                PreconditionOutcome::from_check(actual.trim() == expected_result.trim(), || {
                    format!("SQL Precondition failed. Expected '{}' got '{}'", expected_result, actual)
                })
            }
            Precondition::DbmsType { dbms } => PreconditionOutcome::from_check(dbms.matches(db), || {
                format!("DBMS Precondition failed: expected {}, got {}", dbms, db.short_name())
            }),
            Precondition::RunningAs { username } => {
                let user = conn
                    .user_name()
                    .await?
                    .ok_or_else(|| MigrateError::Database("Cannot determine the connected user".into()))?;
                PreconditionOutcome::from_check(user.eq_ignore_ascii_case(username), || {
                    format!("RunningAs Precondition failed: expected {}, was {}", username, user)
                })
            }
            Precondition::ChangeSetExecuted { id, author, file_path } => {
                let file_path = file_path.as_deref().unwrap_or(&ctx.change_log.file_path);
                let ran = ctx.ran_change_sets.iter().any(|r| {
                    r.key.id == *id && r.key.author == *author && r.key.file_path == file_path
                });
                PreconditionOutcome::from_check(ran, || {
                    format!("Change Set {}::{}::{} has not been run", file_path, id, author)
                })
            }
            Precondition::ChangeLogPropertyDefined { property, value } => {
                let actual = ctx.change_log.properties.get(property);
                match (actual, value) {
                    (None, _) => PreconditionOutcome::Failed(format!("Change log property '{}' is not defined", property)),
                    (Some(actual), Some(expected)) if actual != expected => PreconditionOutcome::Failed(format!(
                        "Expected change log property '{}' to have a value of '{}'. Got '{}'",
                        property, expected, actual
                    )),
                    _ => PreconditionOutcome::Passed,
                }
            }
            Precondition::And { .. } | Precondition::Or { .. } | Precondition::Not { .. } => {
                return Ok(self.check(ctx).await)
            }
        };
        Ok(outcome)
    }
}

async fn check_all(preconditions: &[Precondition], ctx: &PreconditionContext<'_>) -> PreconditionOutcome {
    for child in preconditions {
        let outcome = child.check(ctx).await;
        if !outcome.is_passed() {
            return outcome;
        }
    }
    PreconditionOutcome::Passed
}

async fn row_count(ctx: &PreconditionContext<'_>, schema: Option<&str>, table: &str) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {}",
        ctx.database.escape_table_name(None, schema, table)
    );
    ctx.connection
        .query_scalar(&sql)
        .await?
        .and_then(|v| v.as_i64())
        .ok_or_else(|| MigrateError::Database(format!("No row count returned for {}", table)))
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::And { .. } => f.write_str("and"),
            Precondition::Or { .. } => f.write_str("or"),
            Precondition::Not { .. } => f.write_str("not"),
            Precondition::TableExists { table_name, .. } => write!(f, "tableExists {}", table_name),
            Precondition::ColumnExists {
                table_name,
                column_name,
                ..
            } => write!(f, "columnExists {}.{}", table_name, column_name),
            Precondition::ViewExists { view_name, .. } => write!(f, "viewExists {}", view_name),
            Precondition::SequenceExists { sequence_name, .. } => write!(f, "sequenceExists {}", sequence_name),
            Precondition::RowCount { table_name, .. } => write!(f, "rowCount {}", table_name),
            Precondition::TableIsEmpty { table_name, .. } => write!(f, "tableIsEmpty {}", table_name),
            Precondition::SqlCheck { .. } => f.write_str("sqlCheck"),
            Precondition::DbmsType { dbms } => write!(f, "dbms {}", dbms),
            Precondition::RunningAs { username } => write!(f, "runningAs {}", username),
            Precondition::ChangeSetExecuted { id, author, .. } => write!(f, "changeSetExecuted {}::{}", id, author),
            Precondition::ChangeLogPropertyDefined { property, .. } => {
                write!(f, "changeLogPropertyDefined {}", property)
            }
        }
    }
}

/// What to do when preconditions fail or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Stop the whole run.
    #[default]
    #[serde(alias = "HALT")]
    Halt,
    /// Skip the change set; it is tried again next run.
    #[serde(alias = "CONTINUE")]
    Continue,
    /// Record the change set as ran without executing it.
    #[serde(alias = "MARK_RAN")]
    MarkRan,
    /// Log a warning and run the change set anyway.
    #[serde(alias = "WARN")]
    Warn,
}

/// How preconditions behave when generating SQL instead of executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlOutputPolicy {
    /// Treat preconditions as passed.
    #[default]
    #[serde(alias = "IGNORE")]
    Ignore,
    /// Evaluate them against the connection.
    #[serde(alias = "TEST")]
    Test,
    /// Refuse to generate SQL.
    #[serde(alias = "FAIL")]
    Fail,
}

/// Decision taken for a change set after its preconditions ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionAction {
    Run,
    Skip(String),
    MarkRan(String),
}

/// Preconditions with their failure policies. The list is an implicit AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreconditionContainer {
    #[serde(default)]
    pub on_fail: FailPolicy,
    #[serde(default)]
    pub on_error: FailPolicy,
    #[serde(default)]
    pub on_sql_output: SqlOutputPolicy,
    #[serde(default)]
    pub on_fail_message: Option<String>,
    #[serde(default)]
    pub on_error_message: Option<String>,
    #[serde(default)]
    pub root: Vec<Precondition>,
}

impl PreconditionContainer {
    pub fn new(root: Vec<Precondition>) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn on_fail(mut self, policy: FailPolicy) -> Self {
        self.on_fail = policy;
        self
    }

    pub fn on_error(mut self, policy: FailPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn on_sql_output(mut self, policy: SqlOutputPolicy) -> Self {
        self.on_sql_output = policy;
        self
    }

    /// Evaluate the preconditions and apply the policies.
    ///
    /// `owner` names the change set (or change log) in messages. HALT turns a
    /// failure into an error; the other policies become a [`PreconditionAction`].
    pub async fn evaluate(
        &self,
        ctx: &PreconditionContext<'_>,
        owner: &str,
        output_mode: bool,
    ) -> Result<PreconditionAction> {
        if output_mode {
            match self.on_sql_output {
                SqlOutputPolicy::Ignore => return Ok(PreconditionAction::Run),
                SqlOutputPolicy::Fail => {
                    return Err(MigrateError::PreconditionFailed {
                        change_set: owner.to_string(),
                        messages: vec!["Preconditions cannot be evaluated while generating SQL".into()],
                    })
                }
                SqlOutputPolicy::Test => {}
            }
        }

        match check_all(&self.root, ctx).await {
            PreconditionOutcome::Passed => Ok(PreconditionAction::Run),
            PreconditionOutcome::Failed(message) => {
                let message = self.on_fail_message.clone().unwrap_or(message);
                match self.on_fail {
                    FailPolicy::Halt => Err(MigrateError::PreconditionFailed {
                        change_set: owner.to_string(),
                        messages: vec![message],
                    }),
                    policy => Ok(Self::soft(policy, owner, message)),
                }
            }
            PreconditionOutcome::Errored(message) => {
                let message = self.on_error_message.clone().unwrap_or(message);
                match self.on_error {
                    FailPolicy::Halt => Err(MigrateError::PreconditionErrored {
                        change_set: owner.to_string(),
                        message,
                    }),
                    policy => Ok(Self::soft(policy, owner, message)),
                }
            }
        }
    }

    fn soft(policy: FailPolicy, owner: &str, message: String) -> PreconditionAction {
        match policy {
            FailPolicy::Warn => {
                warn!("Precondition failed for {}, running anyway: {}", owner, message);
                PreconditionAction::Run
            }
            FailPolicy::Continue => {
                info!("Skipping {}: {}", owner, message);
                PreconditionAction::Skip(message)
            }
            FailPolicy::MarkRan => {
                info!("Marking {} as ran: {}", owner, message);
                PreconditionAction::MarkRan(message)
            }
            FailPolicy::Halt => PreconditionAction::Skip(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::ChangeLog;
    use crate::database::DatabaseKind;
    use crate::testing::MockConnection;

    fn passing() -> Precondition {
        Precondition::DbmsType {
            dbms: DbmsSet::parse("postgresql").unwrap(),
        }
    }

    fn failing() -> Precondition {
        Precondition::DbmsType {
            dbms: DbmsSet::parse("oracle").unwrap(),
        }
    }

    async fn outcome(precondition: Precondition) -> PreconditionOutcome {
        let connection = MockConnection::new();
        let database = Database::new(DatabaseKind::Postgres);
        let change_log = ChangeLog::new("db/changelog.yaml");
        let ctx = PreconditionContext {
            connection: &connection,
            database: &database,
            change_log: &change_log,
            ran_change_sets: &[],
            change_set: None,
        };
        precondition.check(&ctx).await
    }

    #[tokio::test]
    async fn test_and_composition() {
        let both = Precondition::And {
            preconditions: vec![passing(), passing()],
        };
        assert_eq!(outcome(both).await, PreconditionOutcome::Passed);

        let mixed = Precondition::And {
            preconditions: vec![passing(), failing()],
        };
        match outcome(mixed).await {
            PreconditionOutcome::Failed(message) => assert!(message.contains("expected oracle")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_or_composition() {
        let none = Precondition::Or {
            preconditions: vec![failing(), failing()],
        };
        assert!(matches!(outcome(none).await, PreconditionOutcome::Failed(_)));

        let one = Precondition::Or {
            preconditions: vec![passing(), failing()],
        };
        assert_eq!(outcome(one).await, PreconditionOutcome::Passed);
    }

    #[tokio::test]
    async fn test_or_stops_at_first_error() {
        let broken = Precondition::SqlCheck {
            sql: "SELECT broken".into(),
            expected_result: "1".into(),
        };
        let error_then_pass = Precondition::Or {
            preconditions: vec![failing(), broken, passing()],
        };
        assert!(matches!(outcome(error_then_pass).await, PreconditionOutcome::Errored(_)));

        let pass_then_error = Precondition::Or {
            preconditions: vec![passing(), Precondition::SqlCheck {
                sql: "SELECT broken".into(),
                expected_result: "1".into(),
            }],
        };
        assert_eq!(outcome(pass_then_error).await, PreconditionOutcome::Passed);
    }

    #[tokio::test]
    async fn test_not_composition() {
        let not_passing = Precondition::Not {
            preconditions: vec![passing()],
        };
        assert!(matches!(outcome(not_passing).await, PreconditionOutcome::Failed(_)));

        let not_failing = Precondition::Not {
            preconditions: vec![failing()],
        };
        assert_eq!(outcome(not_failing).await, PreconditionOutcome::Passed);
    }

    #[tokio::test]
    async fn test_sql_check_uses_connection() {
        let connection = MockConnection::new().with_scalar("SELECT COUNT(*) FROM person", 3i64);
        let database = Database::new(DatabaseKind::Postgres);
        let change_log = ChangeLog::new("db/changelog.yaml");
        let ctx = PreconditionContext {
            connection: &connection,
            database: &database,
            change_log: &change_log,
            ran_change_sets: &[],
            change_set: None,
        };
        let check = Precondition::SqlCheck {
            sql: "SELECT COUNT(*) FROM person".into(),
            expected_result: "3".into(),
        };
        assert_eq!(check.check(&ctx).await, PreconditionOutcome::Passed);

        let count = Precondition::RowCount {
            schema_name: None,
            table_name: "person".into(),
            expected_rows: 2,
        };
        match count.check(&ctx).await {
            PreconditionOutcome::Failed(message) => assert!(message.contains("It contains 3 rows")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_failure_is_an_error_not_a_failure() {
        let check = Precondition::SqlCheck {
            sql: "SELECT broken".into(),
            expected_result: "1".into(),
        };
        assert!(matches!(outcome(check).await, PreconditionOutcome::Errored(_)));
    }

    #[tokio::test]
    async fn test_container_policies() {
        let connection = MockConnection::new();
        let database = Database::new(DatabaseKind::Postgres);
        let change_log = ChangeLog::new("db/changelog.yaml");
        let ctx = PreconditionContext {
            connection: &connection,
            database: &database,
            change_log: &change_log,
            ran_change_sets: &[],
            change_set: None,
        };

        let halt = PreconditionContainer::new(vec![failing()]);
        assert!(matches!(
            halt.evaluate(&ctx, "cs", false).await,
            Err(MigrateError::PreconditionFailed { .. })
        ));

        let mark = PreconditionContainer::new(vec![failing()]).on_fail(FailPolicy::MarkRan);
        assert!(matches!(mark.evaluate(&ctx, "cs", false).await, Ok(PreconditionAction::MarkRan(_))));

        let warn = PreconditionContainer::new(vec![failing()]).on_fail(FailPolicy::Warn);
        assert_eq!(warn.evaluate(&ctx, "cs", false).await.unwrap(), PreconditionAction::Run);

        let skip = PreconditionContainer::new(vec![failing()]).on_fail(FailPolicy::Continue);
        assert!(matches!(skip.evaluate(&ctx, "cs", false).await, Ok(PreconditionAction::Skip(_))));

        // Ignored entirely while generating SQL.
        assert_eq!(halt.evaluate(&ctx, "cs", true).await.unwrap(), PreconditionAction::Run);

        let refuse = PreconditionContainer::new(vec![passing()]).on_sql_output(SqlOutputPolicy::Fail);
        assert!(refuse.evaluate(&ctx, "cs", true).await.is_err());
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = r#"
on_fail: MARK_RAN
root:
  - type: table_exists
    table_name: person
  - type: not
    preconditions:
      - type: dbms
        dbms: oracle
"#;
        let container: PreconditionContainer = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(container.on_fail, FailPolicy::MarkRan);
        assert_eq!(container.root.len(), 2);
    }
}
