//! Cross-process mutual exclusion for migrations.
//!
//! A single row in `DATABASECHANGELOGLOCK` says whether some process is
//! migrating the database. Acquisition never retries; callers decide whether
//! to back off and try again when they get [`MigrateError::LockConflict`].
//!
//! [`MigrateError::LockConflict`]: crate::error::MigrateError::LockConflict

mod table;

pub use table::TableLockService;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::ToSocketAddrs;

use crate::error::Result;

/// A held lock as stored in the lock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockRecord {
    pub id: i64,
    pub locked: bool,
    pub lock_granted: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lock {} held by {} since {}",
            self.id,
            self.locked_by.as_deref().unwrap_or("unknown"),
            self.lock_granted
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".into())
        )
    }
}

#[async_trait]
pub trait LockService: Send + Sync {
    /// Create and seed the lock table if it is missing.
    async fn init(&self) -> Result<()>;

    /// Try once to take the lock. `false` means someone else holds it.
    async fn acquire_lock(&self) -> Result<bool>;

    /// Take the lock or fail with `LockConflict` naming the holder.
    async fn wait_for_lock(&self) -> Result<()>;

    async fn release_lock(&self) -> Result<()>;

    /// Locks currently held.
    async fn list_locks(&self) -> Result<Vec<LockRecord>>;

    /// Clear the lock whoever holds it.
    async fn force_release_lock(&self) -> Result<()>;

    /// Whether this service holds the lock.
    fn has_lock(&self) -> bool;
}

/// `hostname (ip)` of this machine, used as `LOCKEDBY`.
pub fn host_identity() -> String {
    let name = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    let address = (name.as_str(), 0)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip().to_string());
    match address {
        Some(ip) => format!("{} ({})", name, ip),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_identity_is_not_empty() {
        assert!(!host_identity().trim().is_empty());
    }

    #[test]
    fn test_record_display() {
        let record = LockRecord {
            id: 1,
            locked: true,
            lock_granted: None,
            locked_by: Some("build01 (10.0.0.4)".into()),
        };
        assert_eq!(record.to_string(), "lock 1 held by build01 (10.0.0.4) since unknown");
    }
}
