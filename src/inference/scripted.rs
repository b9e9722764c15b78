//! Deterministic backend with canned replies
//!
//! Replies are chosen by substring rules over the prompt, first match wins.
//! Used for offline runs and for exercising the pipeline's failure paths
//! (provider errors, hangs that trip the timeout, out-of-order completion).

use super::{InferenceBackend, InferenceError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted call does
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Return this text after a delay
    Delayed(Duration, String),
    /// Fail with a provider error
    Fail(String),
    /// Never complete
    Hang,
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        ScriptedReply::Text(value.to_string())
    }
}

struct Rule {
    needles: Vec<String>,
    reply: ScriptedReply,
}

/// Rule-based canned inference
pub struct ScriptedBackend {
    rules: Vec<Rule>,
    fallback: ScriptedReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// A backend that fails every call until rules are added
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: ScriptedReply::Fail("no scripted reply".to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` when the prompt contains every needle
    pub fn on(mut self, needles: &[&str], reply: ScriptedReply) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            reply,
        });
        self
    }

    /// Reply used when no rule matches
    pub fn otherwise(mut self, reply: ScriptedReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn pick(&self, prompt: &str) -> ScriptedReply {
        self.rules
            .iter()
            .find(|rule| rule.needles.iter().all(|n| prompt.contains(n.as_str())))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.pick(prompt) {
            ScriptedReply::Text(text) => Ok(text),
            ScriptedReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            ScriptedReply::Fail(reason) => Err(InferenceError::Provider(reason)),
            ScriptedReply::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
