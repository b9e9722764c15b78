//! Reconciliation against prior context
//!
//! The contradiction lens runs per chunk with the memory document bound as
//! a slot, alongside the significance and pattern findings attributed to
//! that chunk. Classifications come back exactly as the lens returned them;
//! an EVOLUTION is never relabelled.

use super::aggregator::LensAggregator;
use super::state::{ContradictionResult, PatternResult, SignificanceResult, StageArtifact};
use crate::lens::{Bindings, PromptTemplate, Slot};
use crate::transcript::Chunk;
use serde_json::json;

/// Placeholder bound when no memory document exists yet
pub const NO_PRIOR_CONTEXT: &str = "(no existing memory document)";

pub struct Reconciler;

impl Reconciler {
    /// Compare each chunk against the prior context.
    pub async fn reconcile(
        aggregator: &LensAggregator<'_>,
        template: &PromptTemplate,
        chunks: &[Chunk],
        prior_context: &str,
        significance: &SignificanceResult,
        patterns: &PatternResult,
    ) -> StageArtifact<ContradictionResult> {
        let context = if prior_context.trim().is_empty() {
            NO_PRIOR_CONTEXT
        } else {
            prior_context
        };

        aggregator
            .run(template, chunks, |chunk| {
                Bindings::new()
                    .with(Slot::PriorContext, context)
                    .with(
                        Slot::ChunkHighlights,
                        chunk_highlights(chunk.index, significance, patterns),
                    )
            })
            .await
    }
}

/// Findings from earlier lenses that came from one chunk, as JSON.
pub fn chunk_highlights(
    chunk_index: usize,
    significance: &SignificanceResult,
    patterns: &PatternResult,
) -> String {
    let moments: Vec<_> = significance
        .moments
        .iter()
        .filter(|m| m.chunk_index == chunk_index)
        .map(|m| &m.item)
        .collect();
    let patterns: Vec<_> = patterns
        .patterns
        .iter()
        .filter(|p| p.chunk_index == chunk_index)
        .map(|p| &p.item)
        .collect();

    format!("{:#}", json!({ "moments": moments, "patterns": patterns }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ScriptedBackend, ScriptedReply};
    use crate::lens::{
        Category, FindingAction, FindingType, LensRunner, Moment, PromptSet, Traced, Weight,
    };
    use crate::transcript::Chunker;
    use std::sync::Arc;

    fn moment(quote: &str) -> Moment {
        Moment {
            quote: quote.to_string(),
            weight: Weight::High,
            category: Category::Decision,
            why: String::new(),
            context_needed: String::new(),
        }
    }

    #[test]
    fn test_highlights_filtered_by_chunk() {
        let significance = SignificanceResult {
            moments: vec![
                Traced::new(0, moment("first")),
                Traced::new(1, moment("second")),
            ],
        };
        let highlights = chunk_highlights(1, &significance, &PatternResult::default());
        assert!(highlights.contains("second"));
        assert!(!highlights.contains("first"));
        assert!(!highlights.contains("chunk_index"));
    }

    #[tokio::test]
    async fn test_evolution_preserved_verbatim() {
        let backend = Arc::new(ScriptedBackend::new().otherwise(ScriptedReply::text(
            r#"{"contradictions":[{"existing":"X","new":"Y","type":"EVOLUTION","resolution":"...","action":"UPDATE"}]}"#,
        )));
        let runner = LensRunner::new(backend.clone());
        let aggregator = LensAggregator::new(&runner, 1);
        let prompts = PromptSet::default();
        let chunks = Chunker::default().split_text("## Ana\nI used to prefer X, now Y.\n");

        let artifact = Reconciler::reconcile(
            &aggregator,
            &prompts.contradiction,
            &chunks,
            "Ana prefers X.",
            &SignificanceResult::default(),
            &PatternResult::default(),
        )
        .await;

        let findings = &artifact.result.contradictions;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].chunk_index, 0);
        assert_eq!(findings[0].item.kind, FindingType::Evolution);
        assert_eq!(findings[0].item.action, FindingAction::Update);
        assert_eq!(
            serde_json::to_value(&artifact).unwrap()["contradictions"][0]["type"],
            "EVOLUTION"
        );

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Existing memory document:\nAna prefers X."));
    }

    #[tokio::test]
    async fn test_empty_context_gets_placeholder() {
        let backend = Arc::new(
            ScriptedBackend::new().otherwise(ScriptedReply::text(r#"{"contradictions":[]}"#)),
        );
        let runner = LensRunner::new(backend.clone());
        let aggregator = LensAggregator::new(&runner, 1);
        let prompts = PromptSet::default();
        let chunks = Chunker::default().split_text("## Ana\nhello\n");

        let artifact = Reconciler::reconcile(
            &aggregator,
            &prompts.contradiction,
            &chunks,
            "  \n",
            &SignificanceResult::default(),
            &PatternResult::default(),
        )
        .await;

        assert!(artifact.result.contradictions.is_empty());
        assert!(!artifact.is_degraded());
        assert!(backend.prompts()[0].contains(NO_PRIOR_CONTEXT));
    }
}
