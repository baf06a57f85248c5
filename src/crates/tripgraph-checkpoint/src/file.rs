//! File-backed state store
//!
//! Stores each thread as one pretty-printed JSON file, `<dir>/<thread_id>.json`,
//! containing the full [`StateRecord`]. Saves write a sibling temporary file
//! and rename it over the target, so a crash mid-write leaves the previous
//! record intact.

use crate::error::{Result, StoreError};
use crate::record::StateRecord;
use crate::traits::StateStore;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

const RECORD_EXTENSION: &str = "json";

/// [`StateStore`] that keeps one JSON file per thread in a directory
#[derive(Debug)]
pub struct FileStateStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStateStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file state store");

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the record files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, thread_id: &str) -> Result<PathBuf> {
        validate_thread_id(thread_id)?;
        Ok(self.dir.join(format!("{}.{}", thread_id, RECORD_EXTENSION)))
    }

    async fn read_record(path: &Path) -> Result<Option<StateRecord>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reject identifiers that would escape the store directory
fn validate_thread_id(thread_id: &str) -> Result<()> {
    let invalid = thread_id.is_empty()
        || thread_id == "."
        || thread_id == ".."
        || thread_id.contains(&['/', '\\', '\0'][..]);

    if invalid {
        return Err(StoreError::InvalidThreadId(thread_id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, thread_id: &str) -> Result<Option<StateRecord>> {
        let path = self.record_path(thread_id)?;
        Self::read_record(&path).await
    }

    async fn save(&self, thread_id: &str, values: Value) -> Result<StateRecord> {
        let path = self.record_path(thread_id)?;
        let _guard = self.write_lock.lock().await;

        let record = match Self::read_record(&path).await? {
            Some(existing) => existing.next(values),
            None => StateRecord::new(thread_id, values),
        };

        let tmp_path = path.with_extension(format!("{}.tmp", RECORD_EXTENSION));
        fs::write(&tmp_path, serde_json::to_vec_pretty(&record)?).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!(thread_id, version = record.version, "Saved state record");
        Ok(record)
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let path = self.record_path(thread_id)?;
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(thread_id, "Deleted state record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
