//! Change logs, change sets and their execution history records.
//!
//! - [`checksum`]: versioned content hashes
//! - [`expression`]: context, label and dbms filters
//! - [`filter`]: change set filters used during iteration
//! - [`iterator`]: forward and reverse walks over a change log
//! - [`visitor`]: what happens to each accepted change set

pub mod checksum;
pub mod expression;
pub mod filter;
pub mod iterator;
pub mod visitor;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::precondition::PreconditionContainer;
use crate::statement::{ChangeSetKey, Statement};

pub use checksum::{CheckSum, ChecksumVersion, UPGRADES};
pub use expression::{ContextExpression, Contexts, DbmsSet, LabelExpression, Labels};
pub use filter::{
    AfterTagFilter, AlreadyRanFilter, ChangeSetFilter, ChangeSetFilterResult, ContextFilter, CountFilter,
    DbmsFilter, ExecutedAfterFilter, LabelFilter, ShouldRunFilter, UpToTagFilter,
};
pub use iterator::ChangeLogIterator;
pub use visitor::{
    ChangeLogSyncVisitor, ChangeSetStatus, ChangeSetVisitor, RollbackVisitor, RunContext, RunSummary,
    StatusVisitor, UpdateVisitor, ValidatingVisitor,
};

fn default_true() -> bool {
    true
}

/// One logical change inside a change set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub description: Option<String>,
    /// Restrict this change to some databases.
    #[serde(default, skip_serializing_if = "DbmsSet::is_empty")]
    pub dbms: DbmsSet,
    pub statements: Vec<Statement>,
}

impl Change {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            description: None,
            dbms: DbmsSet::default(),
            statements,
        }
    }

    pub fn description(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => self
                .statements
                .iter()
                .map(Statement::summary)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<Statement> for Change {
    fn from(statement: Statement) -> Self {
        Change::new(vec![statement])
    }
}

/// An identified, ordered unit of changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub id: String,
    pub author: String,
    /// Filled from the change log when left blank.
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Explicit rollback; derived from the changes when empty.
    #[serde(default)]
    pub rollback: Vec<Statement>,
    #[serde(default)]
    pub contexts: ContextExpression,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub dbms: DbmsSet,
    #[serde(default)]
    pub run_always: bool,
    #[serde(default)]
    pub run_on_change: bool,
    #[serde(default = "default_true")]
    pub run_in_transaction: bool,
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
    /// Stored checksums that are accepted in addition to the computed one.
    #[serde(default)]
    pub valid_checksums: Vec<String>,
    #[serde(default)]
    pub preconditions: Option<PreconditionContainer>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl ChangeSet {
    pub fn new(id: impl Into<String>, author: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            file_path: file_path.into(),
            changes: Vec::new(),
            rollback: Vec::new(),
            contexts: ContextExpression::default(),
            labels: Labels::default(),
            dbms: DbmsSet::default(),
            run_always: false,
            run_on_change: false,
            run_in_transaction: true,
            fail_on_error: true,
            valid_checksums: Vec::new(),
            preconditions: None,
            comments: None,
        }
    }

    pub fn with_change(mut self, change: impl Into<Change>) -> Self {
        self.changes.push(change.into());
        self
    }

    pub fn with_statement(self, statement: impl Into<Statement>) -> Self {
        self.with_change(statement.into())
    }

    pub fn with_rollback(mut self, statement: impl Into<Statement>) -> Self {
        self.rollback.push(statement.into());
        self
    }

    pub fn key(&self) -> ChangeSetKey {
        ChangeSetKey {
            id: self.id.clone(),
            author: self.author.clone(),
            file_path: self.file_path.clone(),
        }
    }

    pub fn is_same(&self, key: &ChangeSetKey) -> bool {
        self.id == key.id && self.author == key.author && self.file_path == key.file_path
    }

    pub fn description(&self) -> String {
        self.changes
            .iter()
            .map(Change::description)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Statements that apply to `database`, honouring change-level `dbms`.
    pub fn statements_for<'a>(&'a self, database: &'a Database) -> impl Iterator<Item = &'a Statement> + 'a {
        self.changes
            .iter()
            .filter(move |change| change.dbms.matches(database))
            .flat_map(|change| change.statements.iter())
    }

    /// Statements that undo this change set on `database`.
    pub fn rollback_statements(&self, database: &Database) -> Result<Vec<Statement>> {
        if !self.rollback.is_empty() {
            return Ok(self.rollback.clone());
        }
        let statements: Vec<&Statement> = self.statements_for(database).collect();
        let mut inverse = Vec::new();
        for statement in statements.into_iter().rev() {
            match statement.inverse() {
                Some(undo) => inverse.extend(undo),
                None => {
                    return Err(MigrateError::RollbackImpossible(vec![format!(
                        "{}: {} has no automatic rollback",
                        self,
                        statement.kind()
                    )]))
                }
            }
        }
        Ok(inverse)
    }

    fn canonical_content(&self, version: ChecksumVersion, database: &Database) -> Result<String> {
        let mut parts = Vec::new();
        for change in &self.changes {
            if version >= ChecksumVersion::V9 && !change.dbms.matches(database) {
                continue;
            }
            for statement in &change.statements {
                let mut value = match statement {
                    Statement::RawSql(raw) if version >= ChecksumVersion::V8 => {
                        let mut raw = raw.clone();
                        raw.sql = raw.normalized_sql();
                        serde_json::to_value(Statement::RawSql(raw))?
                    }
                    other => serde_json::to_value(other)?,
                };
                if version < ChecksumVersion::V9 {
                    if let serde_json::Value::Object(map) = &mut value {
                        map.remove("statement");
                    }
                }
                parts.push(value);
            }
        }
        Ok(serde_json::to_string(&parts)?)
    }

    /// Checksum of the statement model at `version`.
    pub fn generate_checksum(&self, version: ChecksumVersion, database: &Database) -> Result<CheckSum> {
        Ok(CheckSum::compute(&self.canonical_content(version, database)?, version))
    }

    /// Whether `stored` appears in `valid_checksums` (or a wildcard does).
    pub fn is_whitelisted(&self, stored: &str) -> bool {
        self.valid_checksums
            .iter()
            .any(|entry| checksum::is_wildcard(entry) || entry.trim().eq_ignore_ascii_case(stored.trim()))
    }

    /// Whether a stored checksum still describes this change set.
    ///
    /// A missing checksum is valid; otherwise it is recomputed at its own
    /// version and compared, and whitelisted values are always accepted.
    pub fn is_checksum_valid(&self, stored: Option<&str>, database: &Database) -> bool {
        let Some(stored) = stored.filter(|s| !s.trim().is_empty()) else {
            return true;
        };
        if self.is_whitelisted(stored) {
            return true;
        }
        match CheckSum::from_str(stored) {
            Ok(parsed) => self
                .generate_checksum(parsed.version(), database)
                .is_ok_and(|current| current == parsed),
            Err(_) => false,
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.file_path, self.id, self.author)
    }
}

/// An ordered list of change sets read from one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub preconditions: Option<PreconditionContainer>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub change_sets: Vec<ChangeSet>,
}

impl ChangeLog {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_change_set(mut self, change_set: ChangeSet) -> Self {
        self.add_change_set(change_set);
        self
    }

    /// Append a change set, defaulting its file path to the change log's.
    pub fn add_change_set(&mut self, mut change_set: ChangeSet) {
        if change_set.file_path.is_empty() {
            change_set.file_path = self.file_path.clone();
        }
        self.change_sets.push(change_set);
    }

    /// Parse a YAML change log; `file_path` is used when the file names none.
    pub fn from_yaml(content: &str, file_path: &str) -> Result<Self> {
        let mut change_log: ChangeLog = serde_yaml::from_str(content)?;
        if change_log.file_path.is_empty() {
            change_log.file_path = file_path.to_string();
        }
        let path = change_log.file_path.clone();
        for change_set in &mut change_log.change_sets {
            if change_set.file_path.is_empty() {
                change_set.file_path = path.clone();
            }
        }
        Ok(change_log)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content, &path.to_string_lossy())
    }

    pub fn get(&self, key: &ChangeSetKey) -> Option<&ChangeSet> {
        self.change_sets.iter().find(|cs| cs.is_same(key))
    }

    /// Reject blank or duplicated change set identities.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut problems = Vec::new();
        for change_set in &self.change_sets {
            if change_set.id.trim().is_empty() || change_set.author.trim().is_empty() {
                problems.push(format!("Change set in {} needs both an id and an author", change_set.file_path));
                continue;
            }
            if !seen.insert(change_set.key()) {
                problems.push(format!("Duplicate change set identifier: {}", change_set));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(MigrateError::ChangeLog(problems.join("; ")))
        }
    }
}

/// Outcome recorded for a change set in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecType {
    Executed,
    Reran,
    Skipped,
    MarkRan,
    Failed,
}

impl ExecType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecType::Executed => "EXECUTED",
            ExecType::Reran => "RERAN",
            ExecType::Skipped => "SKIPPED",
            ExecType::MarkRan => "MARK_RAN",
            ExecType::Failed => "FAILED",
        }
    }

    /// A failed change set is tried again on the next run.
    pub fn counts_as_ran(self) -> bool {
        self != ExecType::Failed
    }
}

impl FromStr for ExecType {
    type Err = MigrateError;

    fn from_str(text: &str) -> Result<Self> {
        match text.trim().to_uppercase().as_str() {
            "EXECUTED" => Ok(ExecType::Executed),
            "RERAN" => Ok(ExecType::Reran),
            "SKIPPED" => Ok(ExecType::Skipped),
            "MARK_RAN" => Ok(ExecType::MarkRan),
            "FAILED" => Ok(ExecType::Failed),
            other => Err(MigrateError::State(format!("Unknown exec type '{}'", other))),
        }
    }
}

impl fmt::Display for ExecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change set as recorded in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RanChangeSet {
    pub key: ChangeSetKey,
    pub date_executed: Option<DateTime<Utc>>,
    pub order_executed: i64,
    pub exec_type: ExecType,
    pub last_checksum: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub liquibase_version: String,
    #[serde(default)]
    pub contexts: Option<String>,
    #[serde(default)]
    pub labels: Option<String>,
    #[serde(default)]
    pub deployment_id: Option<String>,
}

impl RanChangeSet {
    pub fn is_for(&self, change_set: &ChangeSet) -> bool {
        change_set.is_same(&self.key)
    }
}

impl fmt::Display for RanChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.key.file_path, self.key.id, self.key.author)
    }
}
