//! Single-lens invocation
//!
//! A lens call never fails the run. Timeouts, provider errors and parse
//! failures all come back as a `LensOutput` variant and are logged here.

use super::parse::{parse_response, LensOutput};
use super::Lens;
use crate::inference::{InferenceBackend, InferenceError};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for one inference call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs lens prompts against an inference backend
#[derive(Clone)]
pub struct LensRunner {
    backend: Arc<dyn InferenceBackend>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
}

impl LensRunner {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Allow `max_retries` extra attempts, backing off exponentially
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Call the backend with timeout and bounded retries.
    pub async fn infer(&self, lens: Lens, prompt: &str) -> Result<String, InferenceError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.backend.infer(prompt)).await
            {
                Ok(result) => result,
                Err(_) => Err(InferenceError::Timeout(self.timeout)),
            };

            match result {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt));
                    tracing::warn!(
                        lens = %lens,
                        attempt = attempt + 1,
                        error = %e,
                        "Inference failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run a rendered prompt and parse the response as `T`.
    pub async fn run<T: DeserializeOwned>(&self, lens: Lens, prompt: &str) -> LensOutput<T> {
        match self.infer(lens, prompt).await {
            Ok(raw) => {
                let output = parse_response::<T>(&raw);
                if !output.is_structured() {
                    tracing::warn!(lens = %lens, "Lens returned unstructured output");
                }
                output
            }
            Err(e) => {
                tracing::warn!(lens = %lens, backend = self.backend.name(), error = %e, "Lens call failed");
                LensOutput::Absent(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ScriptedBackend, ScriptedReply};
    use crate::lens::types::SignificanceResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails a fixed number of times, then succeeds
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceBackend for Flaky {
        async fn infer(&self, _prompt: &str) -> Result<String, InferenceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(InferenceError::Transport("connection reset".to_string()))
            } else {
                Ok(r#"{"moments":[]}"#.to_string())
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_structured_result() {
        let backend = ScriptedBackend::new().otherwise(ScriptedReply::text(
            r#"{"moments":[{"quote":"...","weight":"HIGH","category":"DECISION","why":"...","context_needed":"..."}]}"#,
        ));
        let runner = LensRunner::new(Arc::new(backend));
        match runner.run::<SignificanceResponse>(Lens::Significance, "p").await {
            LensOutput::Structured(r) => assert_eq!(r.moments.len(), 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        let backend = ScriptedBackend::new().otherwise(ScriptedReply::Hang);
        let runner = LensRunner::new(Arc::new(backend)).with_timeout(Duration::from_millis(20));
        match runner.run::<SignificanceResponse>(Lens::Significance, "p").await {
            LensOutput::Absent(reason) => assert!(reason.contains("timed out")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_is_absent() {
        let backend = ScriptedBackend::new();
        let runner = LensRunner::new(Arc::new(backend));
        assert!(matches!(
            runner.run::<SignificanceResponse>(Lens::Pattern, "p").await,
            LensOutput::Absent(_)
        ));
    }

    #[tokio::test]
    async fn test_prose_is_unstructured() {
        let backend = ScriptedBackend::new().otherwise(ScriptedReply::text("I found nothing."));
        let runner = LensRunner::new(Arc::new(backend));
        assert_eq!(
            runner.run::<SignificanceResponse>(Lens::Significance, "p").await,
            LensOutput::Unstructured("I found nothing.".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let backend = Arc::new(Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let runner = LensRunner::new(backend.clone());
        assert!(runner.infer(Lens::Significance, "p").await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_retries() {
        let backend = Arc::new(Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let runner =
            LensRunner::new(backend.clone()).with_retries(2, Duration::from_millis(1));
        assert!(runner.infer(Lens::Significance, "p").await.is_ok());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);

        let backend = Arc::new(Flaky {
            failures: 5,
            calls: AtomicUsize::new(0),
        });
        let runner =
            LensRunner::new(backend.clone()).with_retries(1, Duration::from_millis(1));
        assert!(runner.infer(Lens::Significance, "p").await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
