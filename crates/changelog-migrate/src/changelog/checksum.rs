//! Versioned change set checksums.
//!
//! A checksum is stored as `"<version>:<md5 hex>"`. The version prefix says
//! which canonical form was hashed, so a stored value can always be
//! recomputed the same way it was produced.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MigrateError, Result};

/// Algorithm versions, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChecksumVersion {
    /// Canonical JSON of the statement payloads.
    V7,
    /// V7 with whitespace runs in raw SQL collapsed.
    V8,
    /// V8 plus statement kind tags; changes filtered out by `dbms` are dropped.
    V9,
}

/// Which older versions may be rewritten in place to a newer one.
pub const UPGRADES: &[(ChecksumVersion, ChecksumVersion, bool)] = &[
    (ChecksumVersion::V8, ChecksumVersion::V9, true),
    (ChecksumVersion::V7, ChecksumVersion::V9, false),
];

impl ChecksumVersion {
    pub const CURRENT: ChecksumVersion = ChecksumVersion::V9;

    pub fn number(self) -> u8 {
        match self {
            ChecksumVersion::V7 => 7,
            ChecksumVersion::V8 => 8,
            ChecksumVersion::V9 => 9,
        }
    }

    /// Whether a checksum stored at `self` can be silently replaced by one
    /// computed at `newer`.
    pub fn upgrades_to(self, newer: ChecksumVersion) -> bool {
        UPGRADES
            .iter()
            .find(|(from, to, _)| *from == self && *to == newer)
            .is_some_and(|(_, _, compatible)| *compatible)
    }
}

impl TryFrom<u8> for ChecksumVersion {
    type Error = MigrateError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            7 => Ok(ChecksumVersion::V7),
            8 => Ok(ChecksumVersion::V8),
            9 => Ok(ChecksumVersion::V9),
            other => Err(MigrateError::Config(format!(
                "Unsupported checksum version {} (expected 7, 8 or 9)",
                other
            ))),
        }
    }
}

impl From<ChecksumVersion> for u8 {
    fn from(version: ChecksumVersion) -> Self {
        version.number()
    }
}

impl Default for ChecksumVersion {
    fn default() -> Self {
        ChecksumVersion::CURRENT
    }
}

impl fmt::Display for ChecksumVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A versioned content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckSum {
    version: ChecksumVersion,
    digest: String,
}

impl CheckSum {
    /// Hash `content` and tag it with `version`.
    pub fn compute(content: &str, version: ChecksumVersion) -> Self {
        Self {
            version,
            digest: hex::encode(Md5::digest(content.as_bytes())),
        }
    }

    pub fn version(&self) -> ChecksumVersion {
        self.version
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CheckSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, self.digest)
    }
}

impl FromStr for CheckSum {
    type Err = MigrateError;

    fn from_str(text: &str) -> Result<Self> {
        let (version, digest) = text
            .trim()
            .split_once(':')
            .ok_or_else(|| MigrateError::State(format!("Checksum '{}' has no version prefix", text)))?;
        let version = version
            .parse::<u8>()
            .map_err(|_| MigrateError::State(format!("Checksum '{}' has a non-numeric version", text)))
            .and_then(|v| {
                ChecksumVersion::try_from(v).map_err(|_| {
                    MigrateError::State(format!("Checksum '{}' uses unknown version {}", text, v))
                })
            })?;
        if digest.is_empty() {
            return Err(MigrateError::State(format!("Checksum '{}' has an empty digest", text)));
        }
        Ok(Self {
            version,
            digest: digest.to_lowercase(),
        })
    }
}

/// Whether a `valid_checksums` entry accepts any stored value.
pub(crate) fn is_wildcard(entry: &str) -> bool {
    let entry = entry.trim();
    let entry = entry.strip_prefix("1:").unwrap_or(entry);
    matches!(entry.to_ascii_lowercase().as_str(), "any" | "all" | "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let sum = CheckSum::compute("create table person", ChecksumVersion::V9);
        let text = sum.to_string();
        assert!(text.starts_with("9:"));
        assert_eq!(text.len(), 34);
        assert_eq!(text.parse::<CheckSum>().unwrap(), sum);
    }

    #[test]
    fn test_same_content_same_digest() {
        let a = CheckSum::compute("x", ChecksumVersion::V8);
        let b = CheckSum::compute("x", ChecksumVersion::V8);
        assert_eq!(a, b);
        assert_ne!(a, CheckSum::compute("y", ChecksumVersion::V8));
    }

    #[test]
    fn test_parse_rejects_unknown_versions() {
        assert!("3:abcdef".parse::<CheckSum>().is_err());
        assert!("abcdef".parse::<CheckSum>().is_err());
        assert!("9:".parse::<CheckSum>().is_err());
    }

    #[test]
    fn test_upgrade_table() {
        assert!(ChecksumVersion::V8.upgrades_to(ChecksumVersion::V9));
        assert!(!ChecksumVersion::V7.upgrades_to(ChecksumVersion::V9));
        assert!(!ChecksumVersion::V9.upgrades_to(ChecksumVersion::V9));
        assert!(ChecksumVersion::V7 < ChecksumVersion::V9);
    }

    #[test]
    fn test_wildcards() {
        for entry in ["any", "ALL", "*", "1:any", " 1:* "] {
            assert!(is_wildcard(entry), "{entry}");
        }
        assert!(!is_wildcard("9:abc"));
    }
}
