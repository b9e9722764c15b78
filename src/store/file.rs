//! File-backed stage store
//!
//! Directory layout:
//! ```text
//! <agents_dir>/
//! ├── 2026-03-01_significance.json
//! ├── 2026-03-01_patterns.json
//! ├── ...
//! ├── 2026-03-01_full.json
//! └── .state/
//!     └── last_run.json
//! ```
//!
//! Writes go to a temporary sibling and are renamed into place, so a reader
//! never observes a half-written artifact.

use super::{validate_checkpoint_name, Stage, StageStore};
use crate::error::{Error, Result};
use crate::transcript::validate_date;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Stage store writing pretty JSON files
pub struct FileStageStore {
    dir: PathBuf,
    state_dir: PathBuf,
}

impl FileStageStore {
    /// Create a store rooted at `dir`, creating directories as needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let state_dir = dir.join(".state");
        tokio::fs::create_dir_all(&state_dir).await?;
        Ok(Self { dir, state_dir })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for `(date, stage)`
    pub fn path_for(&self, date: &str, stage: Stage) -> PathBuf {
        self.dir.join(format!("{}_{}.json", date, stage))
    }

    fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", name))
    }
}

async fn write_atomic(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Store(format!("invalid path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn read_json(path: &Path) -> Result<Option<Value>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
            Error::Store(format!("corrupt artifact {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl StageStore for FileStageStore {
    async fn put(&self, date: &str, stage: Stage, value: Value) -> Result<()> {
        validate_date(date)?;
        let path = self.path_for(date, stage);
        write_atomic(&path, &value).await?;
        tracing::debug!(date = %date, stage = %stage, path = %path.display(), "Persisted stage");
        Ok(())
    }

    async fn get(&self, date: &str, stage: Stage) -> Result<Option<Value>> {
        validate_date(date)?;
        read_json(&self.path_for(date, stage)).await
    }

    async fn put_checkpoint(&self, name: &str, value: Value) -> Result<()> {
        validate_checkpoint_name(name)?;
        write_atomic(&self.checkpoint_path(name), &value).await
    }

    async fn get_checkpoint(&self, name: &str) -> Result<Option<Value>> {
        validate_checkpoint_name(name)?;
        read_json(&self.checkpoint_path(name)).await
    }
}
