//! Stage persistence
//!
//! Every stage's output is stored as JSON under `(date, stage)`. A put fully
//! replaces the previous value for that key. Checkpoints are a separate
//! flat namespace of named JSON values owned by whoever drives the pipeline.

pub mod file;
pub mod memory;

pub use file::FileStageStore;
pub use memory::MemoryStageStore;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Significance,
    Patterns,
    Contradictions,
    Compression,
    Synthesis,
    /// The complete run state
    Full,
}

impl Stage {
    /// Every stage, in write order
    pub const ALL: [Stage; 6] = [
        Stage::Significance,
        Stage::Patterns,
        Stage::Contradictions,
        Stage::Compression,
        Stage::Synthesis,
        Stage::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Significance => "significance",
            Stage::Patterns => "patterns",
            Stage::Contradictions => "contradictions",
            Stage::Compression => "compression",
            Stage::Synthesis => "synthesis",
            Stage::Full => "full",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage: {}", s))
    }
}

/// Durable storage for stage outputs and checkpoints
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Write a stage output, replacing any previous value
    async fn put(&self, date: &str, stage: Stage, value: Value) -> Result<()>;

    /// Read a stage output
    async fn get(&self, date: &str, stage: Stage) -> Result<Option<Value>>;

    /// Write a named checkpoint, replacing any previous value
    async fn put_checkpoint(&self, name: &str, value: Value) -> Result<()>;

    /// Read a named checkpoint
    async fn get_checkpoint(&self, name: &str) -> Result<Option<Value>>;
}

/// Serialize and store a typed artifact
pub async fn put_artifact<T: Serialize>(
    store: &dyn StageStore,
    date: &str,
    stage: Stage,
    artifact: &T,
) -> Result<()> {
    store.put(date, stage, serde_json::to_value(artifact)?).await
}

/// Load and deserialize a typed artifact
pub async fn get_artifact<T: DeserializeOwned>(
    store: &dyn StageStore,
    date: &str,
    stage: Stage,
) -> Result<Option<T>> {
    match store.get(date, stage).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Checkpoint names become file names, so keep them to a safe alphabet.
pub(crate) fn validate_checkpoint_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Store(format!("invalid checkpoint name: {:?}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_names_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
            assert_eq!(
                serde_json::to_value(stage).unwrap(),
                Value::String(stage.to_string())
            );
        }
        assert!("summary".parse::<Stage>().is_err());
    }

    #[test]
    fn test_checkpoint_names() {
        assert!(validate_checkpoint_name("last_run").is_ok());
        assert!(validate_checkpoint_name("seen-2026").is_ok());
        assert!(validate_checkpoint_name("").is_err());
        assert!(validate_checkpoint_name("../escape").is_err());
        assert!(validate_checkpoint_name("a/b").is_err());
    }

    #[tokio::test]
    async fn test_typed_artifacts() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Probe {
            n: u32,
        }

        let store = MemoryStageStore::new();
        put_artifact(&store, "2026-01-01", Stage::Compression, &Probe { n: 7 })
            .await
            .unwrap();
        let back: Option<Probe> = get_artifact(&store, "2026-01-01", Stage::Compression)
            .await
            .unwrap();
        assert_eq!(back, Some(Probe { n: 7 }));

        let missing: Option<Probe> = get_artifact(&store, "2026-01-02", Stage::Compression)
            .await
            .unwrap();
        assert!(missing.is_none());

        store
            .put("2026-01-03", Stage::Compression, json!({"n": "seven"}))
            .await
            .unwrap();
        let bad = get_artifact::<Probe>(&store, "2026-01-03", Stage::Compression).await;
        assert!(matches!(bad, Err(Error::Serialization(_))));
    }
}
