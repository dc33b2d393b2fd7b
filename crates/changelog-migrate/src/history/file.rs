//! History kept in a JSON file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::{history_row, ran_from_row, tag_placeholder, upsert_cached, HistoryService};
use crate::changelog::{ChangeSet, CheckSum, ExecType, RanChangeSet};
use crate::error::{MigrateError, Result};
use crate::statement::ChangeSetKey;

const FORMAT_VERSION: u32 = 1;

/// On-disk layout of the history file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryDocument {
    format_version: u32,

    change_sets: Vec<RanChangeSet>,

    /// SHA-256 over the document without this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

impl HistoryDocument {
    fn compute_digest(&self) -> Result<String> {
        let mut unsigned = self.clone();
        unsigned.digest = None;
        let content = serde_json::to_string(&unsigned)?;
        Ok(hex::encode(Sha256::digest(content.as_bytes())))
    }

    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: Self = serde_json::from_str(&content)?;
        match &document.digest {
            Some(stored) if stored != &document.compute_digest()? => {
                return Err(MigrateError::State(format!(
                    "History file {} failed its integrity check",
                    path.display()
                )));
            }
            Some(_) => {}
            None => warn!("History file {} has no digest, integrity cannot be verified", path.display()),
        }
        Ok(document)
    }

    /// Atomic write: temp file, then rename.
    fn save(&mut self, path: &Path) -> Result<()> {
        self.digest = None;
        self.digest = Some(self.compute_digest()?);
        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

/// History backed by a JSON file.
///
/// With `dry_run` set, changes stay in memory and the file is never written;
/// this is how SQL-output runs use it.
pub struct FileHistoryService {
    path: PathBuf,
    dry_run: bool,
    deployment_id: String,
    document: Mutex<Option<HistoryDocument>>,
}

impl FileHistoryService {
    pub fn new(path: impl Into<PathBuf>, deployment_id: String) -> Self {
        Self {
            path: path.into(),
            dry_run: false,
            deployment_id,
            document: Mutex::new(None),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the loaded document and persist the result.
    fn modify<T>(&self, f: impl FnOnce(&mut HistoryDocument) -> T) -> Result<T> {
        let mut guard = self.document.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.read()?);
        }
        let document = guard
            .as_mut()
            .ok_or_else(|| MigrateError::State("History file is not loaded".into()))?;
        let result = f(document);
        if !self.dry_run {
            document.save(&self.path)?;
        }
        Ok(result)
    }

    fn read(&self) -> Result<HistoryDocument> {
        if !self.path.exists() {
            return Ok(HistoryDocument {
                format_version: FORMAT_VERSION,
                ..HistoryDocument::default()
            });
        }
        let document = HistoryDocument::load(&self.path)?;
        if document.format_version > FORMAT_VERSION {
            return Err(MigrateError::State(format!(
                "History file {} has format {}, newer than supported {}",
                self.path.display(),
                document.format_version,
                FORMAT_VERSION
            )));
        }
        Ok(document)
    }

    fn snapshot(&self) -> Result<Vec<RanChangeSet>> {
        let mut guard = self.document.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.read()?);
        }
        Ok(guard.as_ref().map(|d| d.change_sets.clone()).unwrap_or_default())
    }
}

fn next_order(change_sets: &[RanChangeSet]) -> i64 {
    change_sets.iter().map(|r| r.order_executed).max().unwrap_or(0) + 1
}

#[async_trait]
impl HistoryService for FileHistoryService {
    async fn init(&self) -> Result<()> {
        if self.dry_run || self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        debug!("Creating history file {}", self.path.display());
        self.modify(|_| ())
    }

    async fn ran_change_sets(&self) -> Result<Vec<RanChangeSet>> {
        let mut ran = self.snapshot()?;
        ran.sort_by(|a, b| {
            a.date_executed
                .cmp(&b.date_executed)
                .then(a.order_executed.cmp(&b.order_executed))
        });
        Ok(ran)
    }

    async fn set_exec_type(
        &self,
        change_set: &ChangeSet,
        exec_type: ExecType,
        checksum: Option<&CheckSum>,
    ) -> Result<()> {
        let deployment_id = self.deployment_id.clone();
        self.modify(|document| {
            let order = next_order(&document.change_sets);
            let row = history_row(change_set, exec_type, checksum, order, &deployment_id);
            upsert_cached(&mut document.change_sets, ran_from_row(&row, exec_type));
        })
    }

    async fn remove_from_history(&self, change_set: &ChangeSet) -> Result<()> {
        self.modify(|document| document.change_sets.retain(|r| !r.is_for(change_set)))
    }

    async fn tag(&self, tag: &str) -> Result<()> {
        if self.snapshot()?.is_empty() {
            self.set_exec_type(&tag_placeholder(), ExecType::Executed, None).await?;
        }
        self.modify(|document| {
            if let Some(last) = document.change_sets.iter_mut().max_by_key(|r| r.order_executed) {
                last.tag = Some(tag.to_string());
            }
        })
    }

    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.snapshot()?.iter().any(|r| r.tag.as_deref() == Some(tag)))
    }

    async fn replace_checksum(&self, key: &ChangeSetKey, checksum: &CheckSum) -> Result<()> {
        self.modify(|document| {
            for ran in document.change_sets.iter_mut().filter(|r| &r.key == key) {
                ran.last_checksum = Some(checksum.to_string());
            }
        })
    }

    async fn clear_checksums(&self) -> Result<()> {
        self.modify(|document| document.change_sets.iter_mut().for_each(|r| r.last_checksum = None))
    }

    async fn next_sequence_value(&self) -> Result<i64> {
        Ok(next_order(&self.snapshot()?))
    }

    fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    async fn reset(&self) {
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
