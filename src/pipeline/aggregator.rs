//! Chunk fan-out and ordered merge
//!
//! Chunk calls within one lens stage are independent, so up to
//! `concurrency` of them may be in flight. Completion order is discarded:
//! outputs are sorted by chunk index before they are folded together.

use super::state::{Accumulate, ChunkReport, StageArtifact};
use crate::lens::{Bindings, LensOutput, LensRunner, PromptTemplate};
use crate::transcript::Chunk;
use futures::stream::{self, StreamExt};
use tracing::Instrument;

/// Runs one lens over every chunk and merges the results
pub struct LensAggregator<'a> {
    runner: &'a LensRunner,
    concurrency: usize,
}

impl<'a> LensAggregator<'a> {
    pub fn new(runner: &'a LensRunner, concurrency: usize) -> Self {
        Self {
            runner,
            concurrency: concurrency.max(1),
        }
    }

    /// Runner used for each call
    pub fn runner(&self) -> &LensRunner {
        self.runner
    }

    /// Run `template` over `chunks`, binding slots per chunk with `bind`.
    pub async fn run<R, F>(
        &self,
        template: &PromptTemplate,
        chunks: &[Chunk],
        bind: F,
    ) -> StageArtifact<R>
    where
        R: Accumulate,
        F: Fn(&Chunk) -> Bindings,
    {
        let lens = template.lens();
        let span = tracing::info_span!("lens_stage", lens = %lens, chunks = chunks.len());

        let outputs: Vec<(usize, LensOutput<R::Response>)> = stream::iter(chunks)
            .map(|chunk| {
                let prompt = template.render(&bind(chunk), &chunk.text);
                async move {
                    tracing::debug!(chunk = chunk.index, bytes = chunk.text.len(), "Running lens on chunk");
                    let output = self.runner.run::<R::Response>(lens, &prompt).await;
                    (chunk.index, output)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .instrument(span)
            .await;

        merge(outputs)
    }
}

/// Fold chunk outputs into one artifact, strictly in chunk order.
pub fn merge<R: Accumulate>(mut outputs: Vec<(usize, LensOutput<R::Response>)>) -> StageArtifact<R> {
    outputs.sort_by_key(|(index, _)| *index);

    let mut artifact = StageArtifact::<R>::default();
    for (index, output) in outputs {
        let (response, status) = output.into_parts();
        if let Some(response) = response {
            artifact.result.absorb(index, response);
        }
        artifact.chunks.push(ChunkReport { index, status });
    }
    artifact
}
