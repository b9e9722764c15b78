//! Memweave configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main Memweave configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemweaveConfig {
    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inference provider configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl MemweaveConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for storage
    pub base_dir: PathBuf,

    /// Directory holding one raw transcript per date (`<date>.md`)
    pub raw_dir: PathBuf,

    /// Directory for persisted stage artifacts
    pub agents_dir: PathBuf,

    /// Persisted memory document read as prior context
    pub core_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memweave");

        Self {
            raw_dir: base.join("raw"),
            agents_dir: base.join(".agents"),
            core_file: base.join("core.md"),
            base_dir: base,
        }
    }
}

/// Inference provider kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Anthropic messages API over HTTP (default)
    #[default]
    Anthropic,

    /// Local model invoked as a command (e.g. ollama)
    Ollama,
}

/// Inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Which backend to use
    pub provider: ProviderKind,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_ref: String,

    /// Custom base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Upper bound for a single inference call in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a failed call (0 = single attempt)
    #[serde(default)]
    pub max_retries: u32,

    /// Initial backoff between attempts in milliseconds, doubled per retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Command line for the command backend
    #[serde(default = "default_command")]
    pub command: Vec<String>,
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_command() -> Vec<String> {
    vec![
        "ollama".to_string(),
        "run".to_string(),
        "llama3.2".to_string(),
    ]
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_ref: "anthropic_api_key".to_string(),
            base_url: None,
            max_tokens: 4096,
            timeout_secs: 300,
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            command: default_command(),
        }
    }
}

impl InferenceConfig {
    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key from the environment.
    ///
    /// `api_key_ref` names an environment variable (e.g.
    /// `"anthropic_api_key"` → reads `$ANTHROPIC_API_KEY`). Both the
    /// original casing and the UPPER_CASE form are tried.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_ref)
            .or_else(|_| std::env::var(self.api_key_ref.to_uppercase()))
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum chunk size in bytes
    pub chunk_size: usize,

    /// Number of chunk-level lens calls allowed in flight at once
    pub chunk_concurrency: usize,

    /// Topic that wins when two subjects compete for attention
    #[serde(default)]
    pub primary_subject: Option<String>,

    /// Topic that yields to the primary subject
    #[serde(default)]
    pub secondary_subject: Option<String>,

    /// Phrases that mark a block as explicitly important
    #[serde(default = "default_marker_phrases")]
    pub marker_phrases: Vec<String>,
}

/// Default importance marker phrases
pub fn default_marker_phrases() -> Vec<String> {
    [
        "really important",
        "significant learning",
        "critical",
        "this is important",
        "we need to remember",
        "don't forget",
        "this matters",
        "pay attention",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8000,
            chunk_concurrency: 1,
            primary_subject: None,
            secondary_subject: None,
            marker_phrases: default_marker_phrases(),
        }
    }
}

impl PipelineConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("pipeline.chunk_size must be > 0".to_string()));
        }
        if self.chunk_concurrency == 0 {
            return Err(Error::Config(
                "pipeline.chunk_concurrency must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// Helper module for default directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| dirs_next::home_dir().map(|h| h.join(".local/share")))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            dirs_next::data_local_dir()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemweaveConfig::default();
        assert_eq!(config.pipeline.chunk_size, 8000);
        assert_eq!(config.pipeline.chunk_concurrency, 1);
        assert_eq!(config.inference.provider, ProviderKind::Anthropic);
        assert_eq!(config.inference.timeout(), Duration::from_secs(300));
        assert_eq!(config.inference.max_retries, 0);
        assert!(config.storage.raw_dir.ends_with("raw"));
        assert!(config.storage.core_file.ends_with("core.md"));
    }

    #[test]
    fn test_default_marker_phrases() {
        let phrases = default_marker_phrases();
        assert_eq!(phrases.len(), 8);
        assert!(phrases.iter().any(|p| p == "really important"));
    }

    #[test]
    fn test_partial_toml() {
        let config: MemweaveConfig = toml::from_str(
            r#"
            [inference]
            provider = "ollama"
            model = "llama3.2"
            api_key_ref = "unused"
            max_tokens = 2048
            timeout_secs = 60

            [pipeline]
            chunk_size = 1000
            chunk_concurrency = 4
            primary_subject = "Atlas"
            "#,
        )
        .unwrap();

        assert_eq!(config.inference.provider, ProviderKind::Ollama);
        assert_eq!(config.inference.command[0], "ollama");
        assert_eq!(config.inference.retry_backoff_ms, 500);
        assert_eq!(config.pipeline.chunk_size, 1000);
        assert_eq!(config.pipeline.primary_subject.as_deref(), Some("Atlas"));
        assert_eq!(config.pipeline.marker_phrases.len(), 8);
        // Untouched sections fall back to defaults
        assert!(config.storage.agents_dir.ends_with(".agents"));
    }

    #[test]
    fn test_validate_rejects_zero() {
        let mut pipeline = PipelineConfig::default();
        assert!(pipeline.validate().is_ok());

        pipeline.chunk_size = 0;
        assert!(pipeline.validate().is_err());

        pipeline.chunk_size = 10;
        pipeline.chunk_concurrency = 0;
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip_toml() {
        let config = MemweaveConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MemweaveConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.pipeline.chunk_size, config.pipeline.chunk_size);
        assert_eq!(parsed.inference.model, config.inference.model);
    }
}
