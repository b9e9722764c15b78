//! Tolerant parsing of lens responses
//!
//! Models wrap JSON in prose or code fences. The outermost object is taken
//! to run from the first `{` to the last `}`; anything that fails to
//! deserialize is kept as unstructured text rather than dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Result of one lens invocation
#[derive(Debug, Clone, PartialEq)]
pub enum LensOutput<T> {
    /// Response parsed into the lens schema
    Structured(T),
    /// Response arrived but did not match the schema
    Unstructured(String),
    /// No response (timeout, transport or provider failure)
    Absent(String),
}

impl<T> LensOutput<T> {
    /// Split into the structured value (if any) and its audit status.
    pub fn into_parts(self) -> (Option<T>, CallStatus) {
        match self {
            LensOutput::Structured(value) => (Some(value), CallStatus::Ok),
            LensOutput::Unstructured(raw) => (None, CallStatus::Unstructured { raw }),
            LensOutput::Absent(reason) => (None, CallStatus::Failed { reason }),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, LensOutput::Structured(_))
    }
}

/// Persisted outcome of a lens call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallStatus {
    Ok,
    Unstructured { raw: String },
    Failed { reason: String },
}

impl CallStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, CallStatus::Ok)
    }
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a raw response into the lens schema `T`.
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> LensOutput<T> {
    let Some(json) = extract_json(raw) else {
        return LensOutput::Unstructured(raw.to_string());
    };

    match serde_json::from_str::<T>(json) {
        Ok(value) => LensOutput::Structured(value),
        Err(e) => {
            tracing::debug!(error = %e, "Lens response did not match schema");
            LensOutput::Unstructured(raw.to_string())
        }
    }
}
