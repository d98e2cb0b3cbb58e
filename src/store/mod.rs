//! File-backed document store for workflows and settings.
//!
//! Layout under the root directory:
//!
//! ```text
//! workflows/<id>.json   one record per workflow
//! settings.json         key -> JSON value
//! ```
//!
//! Writes go to a uniquely named temporary file that is then renamed over
//! the target. Read-modify-write cycles are serialized per store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::WorkflowDefinition;
use crate::{Error, ErrorContext, Result};

/// Listing entry without the workflow body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowRecord {
    id: String,
    name: String,
    /// Serialized [`WorkflowDefinition`].
    data: String,
    created_at: u64,
    updated_at: u64,
}

impl WorkflowRecord {
    fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingRecord {
    value: Value,
    updated_at: u64,
}

type SettingsTable = BTreeMap<String, SettingRecord>;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on workflow records.
    workflows_lock: Mutex<()>,
    /// Serializes read-modify-write cycles on the settings file.
    settings_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("workflows")).await?;
        debug!(root = %root.display(), "opened document store");
        Ok(Self {
            root,
            workflows_lock: Mutex::new(()),
            settings_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workflow_path(&self, id: &str) -> Result<PathBuf> {
        let invalid = id.is_empty()
            || id == "."
            || id == ".."
            || id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
        if invalid {
            return Err(Error::validation_with_context(
                format!("invalid workflow id \"{}\"", id),
                ErrorContext::new()
                    .with_field_path("workflow.id")
                    .with_source("file_store"),
            ));
        }
        Ok(self.root.join("workflows").join(format!("{}.json", id)))
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_record(&self, id: &str) -> Result<Option<WorkflowRecord>> {
        let path = self.workflow_path(id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ---- workflows ----

    /// Insert or replace. `created_at` survives updates; `updated_at` is bumped.
    pub async fn save_workflow(&self, workflow: &WorkflowDefinition) -> Result<WorkflowSummary> {
        let _guard = self.workflows_lock.lock().await;
        let now = now_millis();
        let created_at = self
            .read_record(workflow.id())
            .await?
            .map(|r| r.created_at)
            .unwrap_or(now);

        let record = WorkflowRecord {
            id: workflow.id().to_string(),
            name: workflow.name.clone(),
            data: workflow.to_json()?,
            created_at,
            updated_at: now,
        };
        let path = self.workflow_path(workflow.id())?;
        Self::write_atomic(&path, &serde_json::to_vec_pretty(&record)?).await?;
        debug!(workflow_id = %record.id, "saved workflow");
        Ok(record.summary())
    }

    pub async fn load_workflow(&self, id: &str) -> Result<Option<WorkflowDefinition>> {
        match self.read_record(id).await? {
            Some(record) => Ok(Some(WorkflowDefinition::from_json(&record.data)?)),
            None => Ok(None),
        }
    }

    /// Summaries, most recently updated first. Unreadable records are skipped.
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>> {
        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(self.root.join("workflows")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                // Deleted between the directory scan and the read.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<WorkflowRecord>(&bytes) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable workflow record"),
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// Returns whether something was deleted.
    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let _guard = self.workflows_lock.lock().await;
        match fs::remove_file(self.workflow_path(id)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn workflow_exists(&self, id: &str) -> Result<bool> {
        Ok(fs::try_exists(self.workflow_path(id)?).await?)
    }

    pub async fn workflow_count(&self) -> Result<usize> {
        Ok(self.list_workflows().await?.len())
    }

    pub async fn clear_workflows(&self) -> Result<()> {
        let _guard = self.workflows_lock.lock().await;
        let dir = self.root.join("workflows");
        fs::remove_dir_all(&dir).await?;
        fs::create_dir_all(&dir).await?;
        Ok(())
    }

    // ---- settings ----

    async fn read_settings(&self) -> Result<SettingsTable> {
        match fs::read(self.settings_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SettingsTable::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_settings(&self, table: &SettingsTable) -> Result<()> {
        Self::write_atomic(&self.settings_path(), &serde_json::to_vec_pretty(table)?).await
    }

    pub async fn save_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.save_settings([(key.to_string(), serde_json::to_value(value)?)]).await
    }

    /// Save several settings in one write.
    pub async fn save_settings<I>(&self, settings: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let _guard = self.settings_lock.lock().await;
        let mut table = self.read_settings().await?;
        let now = now_millis();
        for (key, value) in settings {
            table.insert(key, SettingRecord { value, updated_at: now });
        }
        self.write_settings(&table).await
    }

    /// The stored value, or `default` when missing or not of type `T`.
    pub async fn load_setting<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let table = self.read_settings().await?;
        let Some(record) = table.get(key) else {
            return Ok(default);
        };
        match serde_json::from_value(record.value.clone()) {
            Ok(v) => Ok(v),
            Err(e) => {
                debug!(key, error = %e, "stored setting has unexpected shape, using default");
                Ok(default)
            }
        }
    }

    pub async fn setting_exists(&self, key: &str) -> Result<bool> {
        Ok(self.read_settings().await?.contains_key(key))
    }

    pub async fn delete_setting(&self, key: &str) -> Result<bool> {
        let _guard = self.settings_lock.lock().await;
        let mut table = self.read_settings().await?;
        let removed = table.remove(key).is_some();
        if removed {
            self.write_settings(&table).await?;
        }
        Ok(removed)
    }

    pub async fn settings_by_prefix(&self, prefix: &str) -> Result<BTreeMap<String, Value>> {
        Ok(self
            .read_settings()
            .await?
            .into_iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, r)| (k, r.value))
            .collect())
    }

    /// Returns the number of removed settings.
    pub async fn delete_settings_by_prefix(&self, prefix: &str) -> Result<usize> {
        let _guard = self.settings_lock.lock().await;
        let mut table = self.read_settings().await?;
        let before = table.len();
        table.retain(|k, _| !k.starts_with(prefix));
        let removed = before - table.len();
        if removed > 0 {
            self.write_settings(&table).await?;
        }
        Ok(removed)
    }

    pub async fn clear_settings(&self) -> Result<()> {
        let _guard = self.settings_lock.lock().await;
        self.write_settings(&SettingsTable::new()).await
    }
}
