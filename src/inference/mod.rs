//! Inference capability
//!
//! The pipeline treats language-model inference as an opaque capability:
//! a prompt goes in, text that may contain embedded JSON comes out, or the
//! call fails. Providers plug in through `InferenceBackend`.
//!
//! ```text
//! LensRunner ──timeout/retry──▶ Arc<dyn InferenceBackend>
//!                                 ├── AnthropicBackend  (HTTP messages API)
//!                                 ├── CommandBackend    (local model process)
//!                                 └── ScriptedBackend   (canned replies)
//! ```

pub mod anthropic;
pub mod command;
pub mod scripted;

pub use anthropic::AnthropicBackend;
pub use command::CommandBackend;
pub use scripted::{ScriptedBackend, ScriptedReply};

use crate::config::{InferenceConfig, ProviderKind};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why an inference call produced no text
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable inference provider.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run a prompt and return the raw response text.
    async fn infer(&self, prompt: &str) -> std::result::Result<String, InferenceError>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}

/// Build the backend selected by configuration.
pub fn backend_from_config(config: &InferenceConfig) -> Result<Arc<dyn InferenceBackend>> {
    match config.provider {
        ProviderKind::Anthropic => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                Error::Config(format!(
                    "No API key found in ${} (set inference.api_key_ref)",
                    config.api_key_ref.to_uppercase()
                ))
            })?;
            let mut backend = AnthropicBackend::new(api_key, config.model.clone())
                .with_max_tokens(config.max_tokens);
            if let Some(base_url) = &config.base_url {
                backend = backend.with_base_url(base_url.clone());
            }
            Ok(Arc::new(backend))
        }
        ProviderKind::Ollama => Ok(Arc::new(CommandBackend::new(&config.command)?)),
    }
}
