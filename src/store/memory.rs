//! In-memory stage store

use super::{validate_checkpoint_name, Stage, StageStore};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stage store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStageStore {
    stages: Arc<RwLock<HashMap<(String, Stage), Value>>>,
    checkpoints: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored stage outputs
    pub async fn len(&self) -> usize {
        self.stages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stages.read().await.is_empty()
    }
}

#[async_trait]
impl StageStore for MemoryStageStore {
    async fn put(&self, date: &str, stage: Stage, value: Value) -> Result<()> {
        self.stages
            .write()
            .await
            .insert((date.to_string(), stage), value);
        Ok(())
    }

    async fn get(&self, date: &str, stage: Stage) -> Result<Option<Value>> {
        Ok(self
            .stages
            .read()
            .await
            .get(&(date.to_string(), stage))
            .cloned())
    }

    async fn put_checkpoint(&self, name: &str, value: Value) -> Result<()> {
        validate_checkpoint_name(name)?;
        self.checkpoints
            .write()
            .await
            .insert(name.to_string(), value);
        Ok(())
    }

    async fn get_checkpoint(&self, name: &str) -> Result<Option<Value>> {
        validate_checkpoint_name(name)?;
        Ok(self.checkpoints.read().await.get(name).cloned())
    }
}
