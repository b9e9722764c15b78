//! Run state and persisted stage artifacts
//!
//! Chunked stages persist their merged findings together with one
//! `ChunkReport` per chunk, so an audit can tell which chunks failed.
//! Single-call stages carry a single status instead.

use crate::lens::{
    CallStatus, CompressionResponse, ContradictionFinding, ContradictionResponse, Moment, Pattern,
    PatternResponse, ProfileUpdate, Representation, SignificanceResponse, SynthesisResult, Traced,
};
use crate::store::Stage;
use crate::transcript::Marker;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one chunk-level lens call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkReport {
    pub index: usize,
    #[serde(flatten)]
    pub status: CallStatus,
}

/// Per-lens accumulator that folds chunk responses in chunk order
pub trait Accumulate: Default + Serialize {
    /// Wire schema the lens answers with
    type Response: DeserializeOwned;

    /// Append one chunk's findings, tagged with the chunk index
    fn absorb(&mut self, chunk_index: usize, response: Self::Response);
}

/// Accumulated significance findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub moments: Vec<Traced<Moment>>,
}

impl Accumulate for SignificanceResult {
    type Response = SignificanceResponse;

    fn absorb(&mut self, chunk_index: usize, response: SignificanceResponse) {
        self.moments.extend(
            response
                .moments
                .into_iter()
                .map(|m| Traced::new(chunk_index, m)),
        );
    }
}

/// Accumulated pattern findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternResult {
    pub patterns: Vec<Traced<Pattern>>,
    pub profile_updates: Vec<Traced<ProfileUpdate>>,
}

impl Accumulate for PatternResult {
    type Response = PatternResponse;

    fn absorb(&mut self, chunk_index: usize, response: PatternResponse) {
        self.patterns.extend(
            response
                .patterns
                .into_iter()
                .map(|p| Traced::new(chunk_index, p)),
        );
        self.profile_updates.extend(
            response
                .profile_updates
                .into_iter()
                .map(|u| Traced::new(chunk_index, u)),
        );
    }
}

/// Accumulated contradiction and evolution findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionResult {
    pub contradictions: Vec<Traced<ContradictionFinding>>,
}

impl Accumulate for ContradictionResult {
    type Response = ContradictionResponse;

    fn absorb(&mut self, chunk_index: usize, response: ContradictionResponse) {
        self.contradictions.extend(
            response
                .contradictions
                .into_iter()
                .map(|c| Traced::new(chunk_index, c)),
        );
    }
}

/// Persisted output of a chunked stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageArtifact<R> {
    #[serde(flatten)]
    pub result: R,
    pub chunks: Vec<ChunkReport>,
}

impl<R> StageArtifact<R> {
    /// Indices of chunks whose call produced no structured result
    pub fn degraded_chunks(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .filter(|c| !c.status.is_ok())
            .map(|c| c.index)
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.chunks.iter().any(|c| !c.status.is_ok())
    }
}

/// Persisted output of the compression stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionArtifact {
    pub representations: Vec<Representation>,
    /// Number of moments submitted
    pub expected: usize,
    #[serde(flatten)]
    pub status: CallStatus,
}

impl CompressionArtifact {
    pub fn is_degraded(&self) -> bool {
        !self.status.is_ok()
    }

    pub(crate) fn from_response(
        response: Option<CompressionResponse>,
        expected: usize,
        status: CallStatus,
    ) -> Self {
        Self {
            representations: response.map(|r| r.representations).unwrap_or_default(),
            expected,
            status,
        }
    }
}

/// Persisted output of the synthesis stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisArtifact {
    #[serde(flatten)]
    pub result: SynthesisResult,
    #[serde(flatten)]
    pub status: CallStatus,
}

impl SynthesisArtifact {
    pub fn is_degraded(&self) -> bool {
        !self.status.is_ok()
    }
}

/// Everything a run produced for one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub date: String,
    pub run_id: Uuid,
    pub processed_at: DateTime<Utc>,
    /// SHA-256 of the transcript text
    pub transcript_digest: String,
    /// SHA-256 of the prior context text
    pub context_digest: String,
    pub chunk_count: usize,
    pub markers: Vec<Marker>,
    pub significance: StageArtifact<SignificanceResult>,
    pub patterns: StageArtifact<PatternResult>,
    pub contradictions: StageArtifact<ContradictionResult>,
    pub compression: Option<CompressionArtifact>,
    pub synthesis: Option<SynthesisArtifact>,
    pub degraded_stages: Vec<Stage>,
    /// Final result as returned to the caller, degradation flags included
    pub result: SynthesisResult,
}

impl RunState {
    pub fn new(date: &str, transcript_digest: String, context_digest: String) -> Self {
        Self {
            date: date.to_string(),
            run_id: Uuid::new_v4(),
            processed_at: Utc::now(),
            transcript_digest,
            context_digest,
            chunk_count: 0,
            markers: Vec::new(),
            significance: StageArtifact::default(),
            patterns: StageArtifact::default(),
            contradictions: StageArtifact::default(),
            compression: None,
            synthesis: None,
            degraded_stages: Vec::new(),
            result: SynthesisResult::default(),
        }
    }

    /// Human-readable degradation notes, one per degraded stage
    pub fn degradation_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        let chunked = [
            (Stage::Significance, self.significance.degraded_chunks()),
            (Stage::Patterns, self.patterns.degraded_chunks()),
            (Stage::Contradictions, self.contradictions.degraded_chunks()),
        ];
        for (stage, chunks) in chunked {
            if !chunks.is_empty() {
                flags.push(format!("{} degraded: chunks {:?} produced no result", stage, chunks));
            }
        }
        if let Some(compression) = &self.compression {
            if compression.is_degraded() {
                flags.push("compression undetermined".to_string());
            }
        }
        if let Some(CallStatus::Failed { reason }) = self.synthesis.as_ref().map(|s| &s.status) {
            flags.push(format!("synthesis unavailable: {}", reason));
        } else if let Some(CallStatus::Unstructured { .. }) =
            self.synthesis.as_ref().map(|s| &s.status)
        {
            flags.push("synthesis unavailable: response was not structured".to_string());
        }
        flags
    }

    /// Stages whose output is incomplete
    pub fn collect_degraded_stages(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        if self.significance.is_degraded() {
            stages.push(Stage::Significance);
        }
        if self.patterns.is_degraded() {
            stages.push(Stage::Patterns);
        }
        if self.contradictions.is_degraded() {
            stages.push(Stage::Contradictions);
        }
        if self.compression.as_ref().is_some_and(|c| c.is_degraded()) {
            stages.push(Stage::Compression);
        }
        if self.synthesis.as_ref().is_some_and(|s| s.is_degraded()) {
            stages.push(Stage::Synthesis);
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::{Category, Weight};
    use serde_json::json;

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
    fn test_absorb_tags_chunk() {
        let mut acc = SignificanceResult::default();
        acc.absorb(
            0,
            SignificanceResponse {
                moments: vec![moment("a"), moment("b")],
            },
        );
        acc.absorb(
            2,
            SignificanceResponse {
                moments: vec![moment("c")],
            },
        );
        let tagged: Vec<(usize, &str)> = acc
            .moments
            .iter()
            .map(|m| (m.chunk_index, m.item.quote.as_str()))
            .collect();
        assert_eq!(tagged, vec![(0, "a"), (0, "b"), (2, "c")]);
    }

    #[test]
    fn test_chunk_report_wire_format() {
        let reports = vec![
            ChunkReport {
                index: 0,
                status: CallStatus::Failed {
                    reason: "inference timed out after 300s".to_string(),
                },
            },
            ChunkReport {
                index: 1,
                status: CallStatus::Ok,
            },
        ];
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(
            json,
            json!([
                {"index": 0, "status": "failed", "reason": "inference timed out after 300s"},
                {"index": 1, "status": "ok"}
            ])
        );
        let back: Vec<ChunkReport> = serde_json::from_value(json).unwrap();
        assert_eq!(back, reports);
    }

    #[test]
    fn test_stage_artifact_flattens_result() {
        let artifact = StageArtifact {
            result: SignificanceResult {
                moments: vec![Traced::new(1, moment("q"))],
            },
            chunks: vec![ChunkReport {
                index: 1,
                status: CallStatus::Ok,
            }],
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["moments"][0]["chunk_index"], 1);
        assert_eq!(json["moments"][0]["quote"], "q");
        assert_eq!(json["chunks"][0]["status"], "ok");
        assert!(!artifact.is_degraded());
    }

    #[test]
    fn test_synthesis_artifact_wire_format() {
        let artifact = SynthesisArtifact {
            result: SynthesisResult {
                summary: "calm".to_string(),
                ..Default::default()
            },
            status: CallStatus::Ok,
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["summary"], "calm");
        assert_eq!(json["status"], "ok");
        let back: SynthesisArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn test_degradation_flags() {
        let mut state = RunState::new("2026-03-01", String::new(), String::new());
        state.patterns.chunks = vec![
            ChunkReport {
                index: 0,
                status: CallStatus::Failed {
                    reason: "x".to_string(),
                },
            },
            ChunkReport {
                index: 1,
                status: CallStatus::Ok,
            },
        ];
        state.synthesis = Some(SynthesisArtifact {
            result: SynthesisResult::default(),
            status: CallStatus::Failed {
                reason: "provider error: overloaded".to_string(),
            },
        });

        assert_eq!(
            state.collect_degraded_stages(),
            vec![Stage::Patterns, Stage::Synthesis]
        );
        assert_eq!(
            state.degradation_flags(),
            vec![
                "patterns degraded: chunks [0] produced no result".to_string(),
                "synthesis unavailable: provider error: overloaded".to_string(),
            ]
        );
    }
}
