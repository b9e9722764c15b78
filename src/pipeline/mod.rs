//! Staged multi-lens synthesis
//!
//! ```text
//! transcript ─▶ Chunker ─▶ MarkerScanner
//!                 │
//!                 ├─▶ significance ──┐  (per chunk, merged by index)
//!                 ├─▶ patterns ──────┤
//!                 └─▶ contradictions ◀┘ + prior context
//!                          │
//!                 compression (all moments, one call)
//!                          │
//!                 synthesis (all outputs, one call)
//!                          │
//!                        full
//! ```
//!
//! Every stage is persisted under `(date, stage)` before the next one
//! starts. Inference and parse failures degrade a stage; only missing
//! input, invalid dates and storage failures end a run with an error.

pub mod aggregator;
pub mod compressor;
pub mod reconciler;
pub mod state;
pub mod synthesizer;

pub use aggregator::LensAggregator;
pub use compressor::Compressor;
pub use reconciler::Reconciler;
pub use state::{
    Accumulate, ChunkReport, CompressionArtifact, ContradictionResult, PatternResult, RunState,
    SignificanceResult, StageArtifact, SynthesisArtifact,
};
pub use synthesizer::{LensOutputs, Subjects, Synthesizer};

use crate::config::{MemweaveConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::inference::{backend_from_config, InferenceBackend};
use crate::lens::prompts::{DEFAULT_PRIMARY_SUBJECT, DEFAULT_SECONDARY_SUBJECT};
use crate::lens::{Bindings, CallStatus, LensRunner, PromptSet, SynthesisResult};
use crate::store::{put_artifact, FileStageStore, Stage, StageStore};
use crate::transcript::{
    validate_date, Chunker, ContextSource, FileContextSource, FileTranscriptSource,
    MarkerScanner, Transcript, TranscriptSource,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Instrument;

/// Checkpoint written after every completed run
pub const LAST_RUN_CHECKPOINT: &str = "last_run";

/// The synthesis pipeline
pub struct Pipeline {
    transcripts: Arc<dyn TranscriptSource>,
    context: Arc<dyn ContextSource>,
    store: Arc<dyn StageStore>,
    runner: LensRunner,
    prompts: PromptSet,
    chunker: Chunker,
    scanner: MarkerScanner,
    concurrency: usize,
    subjects: Subjects,
    /// Dates with a run in flight on this instance
    active: Mutex<HashSet<String>>,
}

impl Pipeline {
    /// Build a file-backed pipeline from configuration
    pub async fn from_config(config: &MemweaveConfig) -> Result<Self> {
        let backend = backend_from_config(&config.inference)?;
        let runner = LensRunner::new(backend)
            .with_timeout(config.inference.timeout())
            .with_retries(
                config.inference.max_retries,
                Duration::from_millis(config.inference.retry_backoff_ms),
            );
        let store = FileStageStore::new(config.storage.agents_dir.clone()).await?;

        PipelineBuilder::new()
            .transcripts(Arc::new(FileTranscriptSource::new(
                config.storage.raw_dir.clone(),
            )))
            .context(Arc::new(FileContextSource::new(
                config.storage.core_file.clone(),
            )))
            .store(Arc::new(store))
            .runner(runner)
            .config(config.pipeline.clone())
            .build()
    }

    /// Stage store this pipeline writes to
    pub fn store(&self) -> &Arc<dyn StageStore> {
        &self.store
    }

    /// Run every stage for `date` and return the synthesized update.
    ///
    /// Fails with `InputMissing` when no transcript exists for the date. An
    /// existing but empty transcript yields an empty result without any
    /// inference.
    pub async fn process(&self, date: &str) -> Result<SynthesisResult> {
        validate_date(date)?;
        let _guard = RunGuard::acquire(&self.active, date)?;

        let span = tracing::info_span!("run", date = %date);
        self.run(date).instrument(span).await
    }

    /// Same as `process`; previous artifacts for the date are overwritten.
    pub async fn reprocess(&self, date: &str) -> Result<SynthesisResult> {
        self.process(date).await
    }

    async fn run(&self, date: &str) -> Result<SynthesisResult> {
        let text = self
            .transcripts
            .load(date)
            .await?
            .ok_or_else(|| Error::InputMissing {
                date: date.to_string(),
            })?;
        let prior_context = self.context.load(date).await?;

        let mut state = RunState::new(date, digest(&text), digest(&prior_context));
        let transcript = Transcript::parse(date, text);

        if transcript.is_blank() {
            tracing::info!("Transcript is empty, skipping lenses");
            return self.finish_empty(state).await;
        }

        let chunks = self.chunker.split(&transcript);
        state.chunk_count = chunks.len();
        state.markers = self.scanner.scan(&transcript, &chunks);
        tracing::info!(
            chunks = chunks.len(),
            markers = state.markers.len(),
            backend = self.runner.backend_name(),
            "Starting lens stages"
        );

        let aggregator = LensAggregator::new(&self.runner, self.concurrency);

        state.significance = aggregator
            .run(&self.prompts.significance, &chunks, |_| Bindings::new())
            .await;
        self.persist(date, Stage::Significance, &state.significance)
            .await?;

        state.patterns = aggregator
            .run(&self.prompts.pattern, &chunks, |_| Bindings::new())
            .await;
        self.persist(date, Stage::Patterns, &state.patterns).await?;

        state.contradictions = Reconciler::reconcile(
            &aggregator,
            &self.prompts.contradiction,
            &chunks,
            &prior_context,
            &state.significance.result,
            &state.patterns.result,
        )
        .await;
        self.persist(date, Stage::Contradictions, &state.contradictions)
            .await?;

        let compression = Compressor::compress(
            &self.runner,
            &self.prompts.compression,
            &state.significance.result.moments,
        )
        .await;
        self.persist(date, Stage::Compression, &compression).await?;
        state.compression = Some(compression);

        let synthesis = Synthesizer::synthesize(
            &self.runner,
            &self.prompts.synthesis,
            &self.subjects,
            &LensOutputs::from_state(&state),
        )
        .await?;
        self.persist(date, Stage::Synthesis, &synthesis).await?;
        state.synthesis = Some(synthesis);

        self.finish(state).await
    }

    /// Persist empty artifacts for a blank transcript so replay sees a
    /// complete run.
    async fn finish_empty(&self, mut state: RunState) -> Result<SynthesisResult> {
        let compression = CompressionArtifact {
            representations: Vec::new(),
            expected: 0,
            status: CallStatus::Ok,
        };
        let synthesis = SynthesisArtifact {
            result: SynthesisResult::default(),
            status: CallStatus::Ok,
        };

        self.persist(state.date.as_str(), Stage::Significance, &state.significance)
            .await?;
        self.persist(state.date.as_str(), Stage::Patterns, &state.patterns)
            .await?;
        self.persist(state.date.as_str(), Stage::Contradictions, &state.contradictions)
            .await?;
        self.persist(state.date.as_str(), Stage::Compression, &compression)
            .await?;
        self.persist(state.date.as_str(), Stage::Synthesis, &synthesis)
            .await?;

        state.compression = Some(compression);
        state.synthesis = Some(synthesis);
        self.finish(state).await
    }

    async fn finish(&self, mut state: RunState) -> Result<SynthesisResult> {
        state.degraded_stages = state.collect_degraded_stages();

        let mut result = state
            .synthesis
            .as_ref()
            .map(|s| s.result.clone())
            .unwrap_or_default();
        result.flags.extend(state.degradation_flags());
        state.result = result.clone();

        self.persist(state.date.as_str(), Stage::Full, &state).await?;
        self.store
            .put_checkpoint(
                LAST_RUN_CHECKPOINT,
                serde_json::json!({
                    "date": state.date,
                    "run_id": state.run_id,
                    "processed_at": state.processed_at,
                    "degraded": !state.degraded_stages.is_empty(),
                }),
            )
            .await?;

        if state.degraded_stages.is_empty() {
            tracing::info!(
                run_id = %state.run_id,
                key_moments = result.key_moments.len(),
                "Run complete"
            );
        } else {
            tracing::warn!(
                run_id = %state.run_id,
                degraded = ?state.degraded_stages,
                "Run complete with degraded stages"
            );
        }
        Ok(result)
    }

    async fn persist<T: Serialize + Sync>(&self, date: &str, stage: Stage, artifact: &T) -> Result<()> {
        put_artifact(self.store.as_ref(), date, stage, artifact).await
    }
}

/// SHA-256 hex digest
fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Marks a date as running until dropped
struct RunGuard<'a> {
    active: &'a Mutex<HashSet<String>>,
    date: String,
}

impl<'a> RunGuard<'a> {
    fn acquire(active: &'a Mutex<HashSet<String>>, date: &str) -> Result<Self> {
        let mut dates = active
            .lock()
            .map_err(|_| Error::Internal("run registry lock poisoned".to_string()))?;
        if !dates.insert(date.to_string()) {
            return Err(Error::RunInProgress {
                date: date.to_string(),
            });
        }
        Ok(Self {
            active,
            date: date.to_string(),
        })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut dates) = self.active.lock() {
            dates.remove(&self.date);
        }
    }
}

/// Builder for Pipeline
pub struct PipelineBuilder {
    transcripts: Option<Arc<dyn TranscriptSource>>,
    context: Option<Arc<dyn ContextSource>>,
    store: Option<Arc<dyn StageStore>>,
    runner: Option<LensRunner>,
    prompts: PromptSet,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            transcripts: None,
            context: None,
            store: None,
            runner: None,
            prompts: PromptSet::default(),
            config: PipelineConfig::default(),
        }
    }

    /// Set the transcript source
    pub fn transcripts(mut self, source: Arc<dyn TranscriptSource>) -> Self {
        self.transcripts = Some(source);
        self
    }

    /// Set the prior-context source
    pub fn context(mut self, source: Arc<dyn ContextSource>) -> Self {
        self.context = Some(source);
        self
    }

    /// Set the stage store
    pub fn store(mut self, store: Arc<dyn StageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a backend with default timeout and no retries
    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.runner = Some(LensRunner::new(backend));
        self
    }

    /// Use a configured runner
    pub fn runner(mut self, runner: LensRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Replace the built-in prompts
    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set pipeline tuning
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        let missing = |what: &str| Error::Config(format!("pipeline requires a {}", what));

        let subjects = Subjects {
            primary: self
                .config
                .primary_subject
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIMARY_SUBJECT.to_string()),
            secondary: self
                .config
                .secondary_subject
                .clone()
                .unwrap_or_else(|| DEFAULT_SECONDARY_SUBJECT.to_string()),
        };

        Ok(Pipeline {
            transcripts: self.transcripts.ok_or_else(|| missing("transcript source"))?,
            context: self.context.ok_or_else(|| missing("context source"))?,
            store: self.store.ok_or_else(|| missing("stage store"))?,
            runner: self.runner.ok_or_else(|| missing("inference backend"))?,
            prompts: self.prompts,
            chunker: Chunker::new(self.config.chunk_size),
            scanner: MarkerScanner::new(&self.config.marker_phrases),
            concurrency: self.config.chunk_concurrency,
            subjects,
            active: Mutex::new(HashSet::new()),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
