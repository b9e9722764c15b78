//! Read-only input sources: the day's transcript and the prior context
//!
//! Both are collaborators owned outside the pipeline. The file-backed
//! implementations read the layout written by the capture process:
//! `<raw_dir>/<date>.md` and a single memory document.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Supplies the raw transcript for a date.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// `Ok(None)` when no transcript exists for `date`. An existing but
    /// empty transcript is `Ok(Some(""))`.
    async fn load(&self, date: &str) -> Result<Option<String>>;
}

/// Supplies the persisted memory document used as prior context.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Current memory document for the run on `date` (empty if none).
    async fn load(&self, date: &str) -> Result<String>;
}

/// Transcripts stored as `<dir>/<date>.md`
pub struct FileTranscriptSource {
    dir: PathBuf,
}

impl FileTranscriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the transcript for `date`
    pub fn path_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{date}.md"))
    }
}

#[async_trait]
impl TranscriptSource for FileTranscriptSource {
    async fn load(&self, date: &str) -> Result<Option<String>> {
        read_optional(&self.path_for(date)).await
    }
}

/// Prior context read from a single file
pub struct FileContextSource {
    path: PathBuf,
}

impl FileContextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContextSource for FileContextSource {
    async fn load(&self, _date: &str) -> Result<String> {
        Ok(read_optional(&self.path).await?.unwrap_or_default())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_transcript_is_none() {
        let dir = TempDir::new().unwrap();
        let source = FileTranscriptSource::new(dir.path());
        assert!(source.load("2026-03-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_transcript_is_some() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2026-03-01.md"), "").unwrap();
        let source = FileTranscriptSource::new(dir.path());
        assert_eq!(source.load("2026-03-01").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_context_defaults_to_empty() {
        let dir = TempDir::new().unwrap();
        let source = FileContextSource::new(dir.path().join("core.md"));
        assert_eq!(source.load("2026-03-01").await.unwrap(), "");

        std::fs::write(dir.path().join("core.md"), "# Core\n").unwrap();
        assert_eq!(source.load("2026-03-01").await.unwrap(), "# Core\n");
    }
}
