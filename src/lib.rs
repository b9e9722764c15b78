//! Memweave - staged multi-lens synthesis of daily transcripts
//!
//! Memweave turns a day's raw conversation log into a reconciled, weighted
//! update for a long-lived memory document. Independent analytical passes
//! ("lenses") run over bounded chunks of the transcript; their findings are
//! merged in chunk order, checked against the existing memory document and
//! synthesized into one structured result.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                            Pipeline                                │
//! │  ┌──────────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │  │ TranscriptSource │──▶│   Chunker    │──▶│  MarkerScanner   │   │
//! │  └──────────────────┘   └──────┬───────┘   └──────────────────┘   │
//! │                                │ chunks                             │
//! │  ┌─────────────────────────────▼─────────────────────────────┐    │
//! │  │                    Lens Aggregator                         │    │
//! │  │  - significance and pattern lenses per chunk               │    │
//! │  │  - bounded fan-out, merge strictly by chunk index          │    │
//! │  └─────────────────────────────┬─────────────────────────────┘    │
//! │  ┌───────────────┐  ┌──────────▼─────────┐                         │
//! │  │ ContextSource │─▶│     Reconciler     │  contradiction lens     │
//! │  └───────────────┘  └──────────┬─────────┘                         │
//! │                     ┌──────────▼─────────┐                         │
//! │                     │     Compressor     │  one call, all moments  │
//! │                     └──────────┬─────────┘                         │
//! │                     ┌──────────▼─────────┐                         │
//! │                     │    Synthesizer     │  one call, all outputs  │
//! │                     └──────────┬─────────┘                         │
//! └────────────────────────────────┼───────────────────────────────────┘
//!                                  │ (date, stage) → JSON
//! ┌────────────────────────────────▼───────────────────────────────────┐
//! │                          StageStore                                 │
//! │   significance · patterns · contradictions · compression ·          │
//! │   synthesis · full · checkpoints                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lenses reach a language model through [`inference::InferenceBackend`].
//! A lens call that times out, fails or returns something unparseable
//! degrades its chunk or stage and is recorded in the persisted artifact;
//! it never aborts the run.
//!
//! ## Modules
//!
//! - [`pipeline`]: Stage orchestration, aggregation, reconciliation, synthesis
//! - [`lens`]: Lens prompts, templates, tolerant parsing and the lens runner
//! - [`inference`]: Pluggable inference backends
//! - [`transcript`]: Transcript blocks, chunking, markers and input sources
//! - [`store`]: Stage persistence and checkpoints
//! - [`config`]: Configuration management

pub mod config;
pub mod error;
pub mod inference;
pub mod lens;
pub mod pipeline;
pub mod store;
pub mod transcript;

pub use config::MemweaveConfig;
pub use error::{Error, Result};
pub use lens::SynthesisResult;
pub use pipeline::{Pipeline, PipelineBuilder};
