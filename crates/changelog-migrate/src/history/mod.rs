//! Change history storage.
//!
//! The [`HistoryService`] trait records which change sets ran, when, and with
//! which checksum. Two backends implement it:
//!
//! - **Table**: the `DATABASECHANGELOG` table, written through the generator
//!   registry and executor (`table.rs`)
//! - **File**: a JSON file next to the change log, for databases that cannot
//!   host the table or for offline runs (`file.rs`)
//!
//! The migrator works with `Arc<dyn HistoryService>` without knowing which.

mod file;
mod table;

pub use file::FileHistoryService;
pub use table::TableHistoryService;

use async_trait::async_trait;
use chrono::Utc;

use crate::changelog::{ChangeSet, CheckSum, ExecType, RanChangeSet};
use crate::error::Result;
use crate::statement::{ChangeSetKey, HistoryRow};

/// Version written to the `LIQUIBASE` history column.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Persistence of the change history.
///
/// Implementations cache the ran list after the first read and keep the cache
/// in step with their own writes, so a run sees its own changes without
/// re-reading storage.
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Create the storage if it is missing. Safe to call repeatedly.
    async fn init(&self) -> Result<()>;

    /// Every recorded change set in execution order.
    async fn ran_change_sets(&self) -> Result<Vec<RanChangeSet>>;

    /// Record an outcome for a change set, replacing any earlier row.
    async fn set_exec_type(
        &self,
        change_set: &ChangeSet,
        exec_type: ExecType,
        checksum: Option<&CheckSum>,
    ) -> Result<()>;

    async fn remove_from_history(&self, change_set: &ChangeSet) -> Result<()>;

    /// Tag the most recent row. An empty history gets a row just for the tag.
    async fn tag(&self, tag: &str) -> Result<()>;

    async fn tag_exists(&self, tag: &str) -> Result<bool>;

    /// Rewrite the stored checksum of one change set.
    async fn replace_checksum(&self, key: &ChangeSetKey, checksum: &CheckSum) -> Result<()>;

    /// Forget every stored checksum so the next run recomputes them.
    async fn clear_checksums(&self) -> Result<()>;

    /// Next `ORDEREXECUTED` value.
    async fn next_sequence_value(&self) -> Result<i64>;

    /// Identifier shared by every row written in this run.
    fn deployment_id(&self) -> &str;

    /// Drop cached state.
    async fn reset(&self);

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

/// A 10-digit run identifier derived from the current time.
pub fn generate_deployment_id() -> String {
    format!("{:010}", Utc::now().timestamp_millis().rem_euclid(10_000_000_000))
}

pub(crate) fn history_row(
    change_set: &ChangeSet,
    exec_type: ExecType,
    checksum: Option<&CheckSum>,
    order_executed: i64,
    deployment_id: &str,
) -> HistoryRow {
    let non_empty = |text: String| if text.is_empty() { None } else { Some(text) };
    HistoryRow {
        key: change_set.key(),
        order_executed,
        exec_type: exec_type.as_str().to_string(),
        md5sum: checksum.map(CheckSum::to_string),
        description: change_set.description(),
        comments: change_set.comments.clone().unwrap_or_default(),
        tag: None,
        liquibase_version: ENGINE_VERSION.to_string(),
        contexts: non_empty(change_set.contexts.to_string()),
        labels: non_empty(change_set.labels.to_string()),
        deployment_id: deployment_id.to_string(),
    }
}

pub(crate) fn ran_from_row(row: &HistoryRow, exec_type: ExecType) -> RanChangeSet {
    RanChangeSet {
        key: row.key.clone(),
        date_executed: Some(Utc::now()),
        order_executed: row.order_executed,
        exec_type,
        last_checksum: row.md5sum.clone(),
        description: row.description.clone(),
        comments: row.comments.clone(),
        tag: row.tag.clone(),
        liquibase_version: row.liquibase_version.clone(),
        contexts: row.contexts.clone(),
        labels: row.labels.clone(),
        deployment_id: Some(row.deployment_id.clone()),
    }
}

/// Replace the cached row for `ran.key`, or append it.
pub(crate) fn upsert_cached(cache: &mut Vec<RanChangeSet>, ran: RanChangeSet) {
    match cache.iter_mut().find(|existing| existing.key == ran.key) {
        Some(existing) => *existing = ran,
        None => cache.push(ran),
    }
}

/// Internal change set that carries a tag on an empty history.
pub(crate) fn tag_placeholder() -> ChangeSet {
    ChangeSet::new(
        Utc::now().timestamp_millis().to_string(),
        "changelog-migrate",
        "changelog-migrate-internal",
    )
}
