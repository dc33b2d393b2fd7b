//! Configuration validation.

use super::Config;
use crate::changelog::{ChecksumVersion, LabelExpression};
use crate::database::DatabaseKind;
use crate::drivers::kind_for_url;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Database validation
    let declared = match &config.database.r#type {
        Some(name) => Some(
            DatabaseKind::from_short_name(name)
                .map_err(|e| MigrateError::Config(format!("database.type: {}", e)))?,
        ),
        None => None,
    };
    let inferred = config.database.url.as_deref().and_then(kind_for_url);
    if declared.is_none() && inferred.is_none() {
        return Err(MigrateError::Config(
            "database.type is required when database.url does not name a known driver".into(),
        ));
    }
    if let (Some(declared), Some(inferred)) = (declared, inferred) {
        if declared != inferred {
            return Err(MigrateError::Config(format!(
                "database.type '{}' does not match database.url, which points at {}",
                declared.short_name(),
                inferred.short_name()
            )));
        }
    }
    if let Some(url) = &config.database.url {
        if url.trim().is_empty() {
            return Err(MigrateError::Config("database.url must not be empty".into()));
        }
    }

    // Changelog validation
    if config.changelog.history_table.trim().is_empty() {
        return Err(MigrateError::Config("changelog.history_table is required".into()));
    }
    if config.changelog.lock_table.trim().is_empty() {
        return Err(MigrateError::Config("changelog.lock_table is required".into()));
    }
    if config.changelog.history_table.eq_ignore_ascii_case(&config.changelog.lock_table) {
        return Err(MigrateError::Config(
            "changelog.history_table and changelog.lock_table must differ".into(),
        ));
    }
    ChecksumVersion::try_from(config.changelog.checksum_version).map_err(|_| {
        MigrateError::Config(format!(
            "changelog.checksum_version {} is not supported",
            config.changelog.checksum_version
        ))
    })?;

    // Run validation
    if config.run.output_delimiter.is_empty() {
        return Err(MigrateError::Config("run.output_delimiter must not be empty".into()));
    }
    if let Some(labels) = &config.run.labels {
        LabelExpression::parse(labels).map_err(|e| MigrateError::Config(format!("run.labels: {}", e)))?;
    }
    if let Some(tag) = &config.run.tag_on_update {
        if tag.trim().is_empty() {
            return Err(MigrateError::Config("run.tag_on_update must not be empty".into()));
        }
    }

    Ok(())
}
