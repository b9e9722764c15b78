//! Final synthesis
//!
//! Runs once over the serialized outputs of every earlier stage. The
//! priority policy lives in the synthesis prompt:
//! - the primary subject wins over the secondary one when both compete
//! - ARCHITECTURE and RELATIONSHIP moments default to HIGH
//! - routine operational material defaults to MEDIUM

use super::state::{
    ContradictionResult, PatternResult, RunState, SignificanceResult, SynthesisArtifact,
};
use crate::error::Result;
use crate::lens::{Bindings, LensRunner, PromptTemplate, Representation, Slot, SynthesisResult};
use crate::transcript::Marker;
use serde::Serialize;

/// Everything the synthesizer sees, borrowed from the run state
#[derive(Debug, Serialize)]
pub struct LensOutputs<'a> {
    pub markers: &'a [Marker],
    pub significance: &'a SignificanceResult,
    pub patterns: &'a PatternResult,
    pub contradictions: &'a ContradictionResult,
    pub compression: &'a [Representation],
}

impl<'a> LensOutputs<'a> {
    pub fn from_state(state: &'a RunState) -> Self {
        Self {
            markers: &state.markers,
            significance: &state.significance.result,
            patterns: &state.patterns.result,
            contradictions: &state.contradictions.result,
            compression: state
                .compression
                .as_ref()
                .map(|c| c.representations.as_slice())
                .unwrap_or(&[]),
        }
    }
}

/// Subjects named by the priority rule
#[derive(Debug, Clone)]
pub struct Subjects {
    pub primary: String,
    pub secondary: String,
}

pub struct Synthesizer;

impl Synthesizer {
    /// Produce the run's update. A failed call yields an empty result with
    /// the failure recorded in the artifact status.
    pub async fn synthesize(
        runner: &LensRunner,
        template: &PromptTemplate,
        subjects: &Subjects,
        outputs: &LensOutputs<'_>,
    ) -> Result<SynthesisArtifact> {
        let serialized = format!("{:#}", serde_json::to_value(outputs)?);
        let bindings = Bindings::new()
            .with(Slot::PrimarySubject, subjects.primary.as_str())
            .with(Slot::SecondarySubject, subjects.secondary.as_str())
            .with(Slot::AgentOutputs, serialized);
        let prompt = template.render(&bindings, "");

        let (result, status) = runner
            .run::<SynthesisResult>(template.lens(), &prompt)
            .await
            .into_parts();

        Ok(SynthesisArtifact {
            result: result.unwrap_or_default(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ScriptedBackend, ScriptedReply};
    use crate::lens::{CallStatus, ChangeAction, PromptSet};
    use std::sync::Arc;

    fn subjects() -> Subjects {
        Subjects {
            primary: "Atlas".to_string(),
            secondary: "consulting".to_string(),
        }
    }

    #[tokio::test]
    async fn test_structured_synthesis() {
        let backend = Arc::new(ScriptedBackend::new().otherwise(ScriptedReply::text(
            r#"Here is the update:
{"summary":"Chose the actor model.","key_moments":[{"content":"actor model","category":"ARCHITECTURE","weight":"HIGH"}],
 "pattern_updates":["decides quickly"],"context_changes":[{"section":"Architecture","action":"ADD","content":"actor model"}],"flags":[]}"#,
        )));
        let runner = LensRunner::new(backend.clone());
        let prompts = PromptSet::default();
        let state = RunState::new("2026-03-01", String::new(), String::new());

        let artifact = Synthesizer::synthesize(
            &runner,
            &prompts.synthesis,
            &subjects(),
            &LensOutputs::from_state(&state),
        )
        .await
        .unwrap();

        assert_eq!(artifact.status, CallStatus::Ok);
        assert_eq!(artifact.result.summary, "Chose the actor model.");
        assert_eq!(artifact.result.context_changes[0].action, ChangeAction::Add);

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("Atlas takes priority over consulting"));
        assert!(prompt.contains("\"markers\": []"));
        assert!(!prompt.contains("run_id"));
    }

    #[tokio::test]
    async fn test_failed_synthesis_is_empty() {
        let runner = LensRunner::new(Arc::new(ScriptedBackend::new()));
        let prompts = PromptSet::default();
        let state = RunState::new("2026-03-01", String::new(), String::new());

        let artifact = Synthesizer::synthesize(
            &runner,
            &prompts.synthesis,
            &subjects(),
            &LensOutputs::from_state(&state),
        )
        .await
        .unwrap();

        assert!(artifact.result.is_empty());
        assert!(matches!(artifact.status, CallStatus::Failed { .. }));
    }
}
