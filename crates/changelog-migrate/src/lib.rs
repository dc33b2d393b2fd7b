//! # changelog-migrate
//!
//! Change-log driven schema migrations with dialect-aware SQL generation.
//!
//! This library provides:
//!
//! - **Statements** describing schema and data changes independent of any database
//! - **SQL generation** for fourteen database families, with per-family overrides
//! - **Checksummed history** in a `DATABASECHANGELOG` table or a JSON file
//! - **A change log lock** so only one process migrates a database at a time
//! - **Preconditions**, contexts, labels and dbms filters to select change sets
//! - **Update, rollback, sync, tag and status** operations with a SQL-output mode
//!
//! ## Example
//!
//! ```rust,no_run
//! use changelog_migrate::{ChangeLog, Config, Migrator};
//!
//! #[tokio::main]
//! async fn main() -> changelog_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let contexts = config.contexts(None);
//!     let labels = config.labels(None)?;
//!     let migrator = Migrator::connect(config)
//!         .await?
//!         .with_change_log(ChangeLog::load("changelog.yaml")?);
//!     let summary = migrator.update(&contexts, &labels).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod changelog;
pub mod config;
pub mod core;
pub mod database;
pub mod datatype;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod generator;
pub mod history;
pub mod lock;
pub mod migrator;
pub mod precondition;
pub mod statement;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use changelog::{
    ChangeLog, ChangeSet, ChangeSetStatus, ChecksumVersion, Contexts, LabelExpression, RanChangeSet, RunSummary,
};
pub use config::Config;
pub use core::{Connection, Row, SqlValue};
pub use database::{Database, DatabaseKind};
pub use error::{MigrateError, Result};
pub use generator::{GeneratorRegistry, Sql};
pub use lock::LockRecord;
pub use migrator::{render_change_log_sql, Migrator, RollbackTarget};
pub use statement::Statement;
