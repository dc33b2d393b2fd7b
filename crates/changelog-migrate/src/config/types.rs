//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::database::QuotingStrategy;
use crate::drivers::redact_url;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database.
    pub database: DatabaseConfig,

    /// Where the history and lock live.
    #[serde(default)]
    pub changelog: ChangeLogConfig,

    /// Defaults for update, rollback and friends.
    #[serde(default)]
    pub run: RunConfig,
}

/// Target database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Short name such as `postgresql` or `mssql`. Inferred from the URL
    /// when omitted.
    #[serde(default)]
    pub r#type: Option<String>,

    /// Driver connection string (`sqlite::memory:`, `postgres://...`).
    /// Optional for offline SQL generation.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub default_schema: Option<String>,

    #[serde(default)]
    pub default_catalog: Option<String>,

    /// Server major version, 0 when unknown.
    #[serde(default)]
    pub major_version: u32,

    #[serde(default)]
    pub quoting_strategy: QuotingStrategy,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("type", &self.r#type)
            .field("url", &self.url.as_deref().map(redact_url))
            .field("default_schema", &self.default_schema)
            .field("default_catalog", &self.default_catalog)
            .field("major_version", &self.major_version)
            .field("quoting_strategy", &self.quoting_strategy)
            .finish()
    }
}

/// History and lock storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogConfig {
    /// History table name (default: DATABASECHANGELOG).
    #[serde(default = "default_history_table")]
    pub history_table: String,

    /// Lock table name (default: DATABASECHANGELOGLOCK).
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// Schema holding both tables; the database default when unset.
    #[serde(default)]
    pub history_schema: Option<String>,

    /// Keep the history in this JSON file instead of a table.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Checksum algorithm version (default: 9).
    #[serde(default = "default_checksum_version")]
    pub checksum_version: u8,
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            history_table: default_history_table(),
            lock_table: default_lock_table(),
            history_schema: None,
            history_file: None,
            checksum_version: default_checksum_version(),
        }
    }
}

/// Run defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Context list, e.g. `test, dev`.
    #[serde(default)]
    pub contexts: Option<String>,

    /// Label expression, e.g. `core and !slow`.
    #[serde(default)]
    pub labels: Option<String>,

    /// Tag applied after every successful update.
    #[serde(default)]
    pub tag_on_update: Option<String>,

    /// Statement delimiter in SQL output (default: `;`).
    #[serde(default = "default_output_delimiter")]
    pub output_delimiter: String,

    /// Overrides `hostname (ip)` in the lock table.
    #[serde(default)]
    pub host_identity: Option<String>,

    /// Overrides the generated deployment id.
    #[serde(default)]
    pub deployment_id: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            contexts: None,
            labels: None,
            tag_on_update: None,
            output_delimiter: default_output_delimiter(),
            host_identity: None,
            deployment_id: None,
        }
    }
}

fn default_history_table() -> String {
    "DATABASECHANGELOG".to_string()
}

fn default_lock_table() -> String {
    "DATABASECHANGELOGLOCK".to_string()
}

fn default_checksum_version() -> u8 {
    9
}

fn default_output_delimiter() -> String {
    ";".to_string()
}
