//! Filters deciding which change sets a run visits.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use super::{ChangeSet, Contexts, LabelExpression, RanChangeSet};
use crate::database::Database;
use crate::error::{MigrateError, Result};
use crate::statement::{ChangeSetKey, Statement};

/// Verdict of one filter on one change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetFilterResult {
    pub accepted: bool,
    pub message: String,
    pub filter: &'static str,
}

impl ChangeSetFilterResult {
    fn accept(filter: &'static str, message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
            filter,
        }
    }

    fn reject(filter: &'static str, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
            filter,
        }
    }
}

pub trait ChangeSetFilter: Send {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult;
}

fn ran_by_key(ran: &[RanChangeSet]) -> HashMap<ChangeSetKey, RanChangeSet> {
    ran.iter()
        .filter(|r| r.exec_type.counts_as_ran())
        .map(|r| (r.key.clone(), r.clone()))
        .collect()
}

/// Accepts change sets whose context expression matches the run's contexts.
pub struct ContextFilter {
    contexts: Contexts,
}

impl ContextFilter {
    pub fn new(contexts: Contexts) -> Self {
        Self { contexts }
    }
}

impl ChangeSetFilter for ContextFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if change_set.contexts.matches(&self.contexts) {
            ChangeSetFilterResult::accept("context", format!("Context matches '{}'", self.contexts))
        } else {
            ChangeSetFilterResult::reject(
                "context",
                format!("Context does not match '{}'", self.contexts),
            )
        }
    }
}

/// Accepts change sets whose labels satisfy the run's label expression.
pub struct LabelFilter {
    expression: LabelExpression,
}

impl LabelFilter {
    pub fn new(expression: LabelExpression) -> Self {
        Self { expression }
    }
}

impl ChangeSetFilter for LabelFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if self.expression.matches(&change_set.labels) {
            ChangeSetFilterResult::accept("label", format!("Labels match '{}'", self.expression))
        } else {
            ChangeSetFilterResult::reject(
                "label",
                format!("Labels '{}' do not match '{}'", change_set.labels, self.expression),
            )
        }
    }
}

/// Accepts change sets whose `dbms` includes the target database.
pub struct DbmsFilter {
    database: Database,
}

impl DbmsFilter {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl ChangeSetFilter for DbmsFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if change_set.dbms.matches(&self.database) {
            ChangeSetFilterResult::accept("dbms", format!("Database {} matches", self.database))
        } else {
            ChangeSetFilterResult::reject(
                "dbms",
                format!("Database {} does not match dbms '{}'", self.database, change_set.dbms),
            )
        }
    }
}

/// Accepts change sets that have not run, always run, or changed under
/// `run_on_change`.
pub struct ShouldRunFilter {
    ran: HashMap<ChangeSetKey, RanChangeSet>,
    database: Database,
}

impl ShouldRunFilter {
    pub fn new(ran: &[RanChangeSet], database: Database) -> Self {
        Self {
            ran: ran_by_key(ran),
            database,
        }
    }
}

impl ChangeSetFilter for ShouldRunFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        let Some(ran) = self.ran.get(&change_set.key()) else {
            return ChangeSetFilterResult::accept("shouldRun", "Change set has not run yet");
        };
        if change_set.run_always {
            return ChangeSetFilterResult::accept("shouldRun", "Change set always runs");
        }
        if change_set.run_on_change && !change_set.is_checksum_valid(ran.last_checksum.as_deref(), &self.database) {
            return ChangeSetFilterResult::accept("shouldRun", "Change set checksum changed");
        }
        ChangeSetFilterResult::reject("shouldRun", "Change set already ran")
    }
}

/// Accepts change sets recorded in the history.
pub struct AlreadyRanFilter {
    ran: HashSet<ChangeSetKey>,
}

impl AlreadyRanFilter {
    pub fn new(ran: &[RanChangeSet]) -> Self {
        Self {
            ran: ran_by_key(ran).into_keys().collect(),
        }
    }
}

impl ChangeSetFilter for AlreadyRanFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if self.ran.contains(&change_set.key()) {
            ChangeSetFilterResult::accept("alreadyRan", "Change set already ran")
        } else {
            ChangeSetFilterResult::reject("alreadyRan", "Change set has not run")
        }
    }
}

/// Accepts change sets executed after the history row carrying a tag.
pub struct AfterTagFilter {
    tag: String,
    after: HashSet<ChangeSetKey>,
}

impl AfterTagFilter {
    /// `ran` must be in execution order.
    pub fn new(tag: &str, ran: &[RanChangeSet]) -> Result<Self> {
        let position = ran
            .iter()
            .rposition(|r| r.tag.as_deref() == Some(tag))
            .ok_or_else(|| MigrateError::ChangeLog(format!("Could not find tag '{}' in the database", tag)))?;
        Ok(Self {
            tag: tag.to_string(),
            after: ran[position + 1..].iter().map(|r| r.key.clone()).collect(),
        })
    }
}

impl ChangeSetFilter for AfterTagFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if self.after.contains(&change_set.key()) {
            ChangeSetFilterResult::accept("afterTag", format!("Change set ran after tag '{}'", self.tag))
        } else {
            ChangeSetFilterResult::reject("afterTag", format!("Change set ran before tag '{}'", self.tag))
        }
    }
}

/// Accepts change sets executed after a point in time.
pub struct ExecutedAfterFilter {
    date: DateTime<Utc>,
    after: HashSet<ChangeSetKey>,
}

impl ExecutedAfterFilter {
    pub fn new(date: DateTime<Utc>, ran: &[RanChangeSet]) -> Self {
        let after = ran
            .iter()
            .filter(|r| r.date_executed.is_some_and(|executed| executed > date))
            .map(|r| r.key.clone())
            .collect();
        Self { date, after }
    }
}

impl ChangeSetFilter for ExecutedAfterFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if self.after.contains(&change_set.key()) {
            ChangeSetFilterResult::accept("executedAfter", format!("Change set ran after {}", self.date))
        } else {
            ChangeSetFilterResult::reject("executedAfter", format!("Change set ran before {}", self.date))
        }
    }
}

/// Accepts change sets up to and including the one that creates a tag.
///
/// When the history already carries the tag, only change sets recorded at or
/// before the tagged row are accepted.
pub struct UpToTagFilter {
    tag: String,
    ran_before_tag: Option<HashSet<ChangeSetKey>>,
    seen_tag: bool,
}

impl UpToTagFilter {
    /// `ran` must be in execution order.
    pub fn new(tag: &str, ran: &[RanChangeSet]) -> Self {
        let ran_before_tag = ran
            .iter()
            .position(|r| r.tag.as_deref() == Some(tag))
            .map(|position| ran[..=position].iter().map(|r| r.key.clone()).collect());
        Self {
            tag: tag.to_string(),
            ran_before_tag,
            seen_tag: false,
        }
    }
}

/// Whether a change set tags the database with `tag`.
pub fn creates_tag(change_set: &ChangeSet, tag: &str) -> bool {
    change_set
        .changes
        .iter()
        .flat_map(|change| change.statements.iter())
        .any(|statement| matches!(statement, Statement::TagDatabase(t) if t.tag == tag))
}

impl ChangeSetFilter for UpToTagFilter {
    fn accepts(&mut self, change_set: &ChangeSet) -> ChangeSetFilterResult {
        if let Some(before) = &self.ran_before_tag {
            return if before.contains(&change_set.key()) {
                ChangeSetFilterResult::accept("upToTag", format!("Change set ran before tag '{}'", self.tag))
            } else {
                ChangeSetFilterResult::reject("upToTag", format!("Change set is after tag '{}'", self.tag))
            };
        }
        if self.seen_tag {
            return ChangeSetFilterResult::reject("upToTag", format!("Change set is after tag '{}'", self.tag));
        }
        if creates_tag(change_set, &self.tag) {
            self.seen_tag = true;
        }
        ChangeSetFilterResult::accept("upToTag", format!("Change set is before tag '{}'", self.tag))
    }
}

/// Accepts the first `limit` change sets that reach it.
pub struct CountFilter {
    limit: usize,
    seen: usize,
}

impl CountFilter {
    pub fn new(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }
}

impl ChangeSetFilter for CountFilter {
    fn accepts(&mut self, _change_set: &ChangeSet) -> ChangeSetFilterResult {
        self.seen += 1;
        if self.seen <= self.limit {
            ChangeSetFilterResult::accept("count", format!("Change set {} of {}", self.seen, self.limit))
        } else {
            ChangeSetFilterResult::reject("count", format!("Only {} change sets were requested", self.limit))
        }
    }
}
