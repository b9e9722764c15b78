//! Domain types produced by the lenses
//!
//! Enum values travel as SCREAMING_SNAKE_CASE on the wire (`"HIGH"`,
//! `"FLAG_FOR_REVIEW"`); lowercase spellings are accepted on input.

use serde::{Deserialize, Serialize};

/// How much a moment matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weight {
    /// Defines the shape of things; keep verbatim
    #[serde(alias = "critical")]
    Critical,
    /// Needed for understanding; keep with context
    #[serde(alias = "high")]
    High,
    /// Useful but compressible
    #[serde(alias = "medium")]
    Medium,
    /// Routine
    #[serde(alias = "low")]
    Low,
}

/// What kind of significance a moment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[serde(alias = "architecture")]
    Architecture,
    #[serde(alias = "identity")]
    Identity,
    #[serde(alias = "relationship")]
    Relationship,
    #[serde(alias = "discovery")]
    Discovery,
    #[serde(alias = "emotional")]
    Emotional,
    #[serde(alias = "decision")]
    Decision,
}

impl Category {
    /// Weight a moment of this category gets when nothing else applies.
    ///
    /// Architecture and relationship moments are elevated; everything else
    /// is treated as routine operational material.
    pub fn default_weight(&self) -> Weight {
        match self {
            Category::Architecture | Category::Relationship => Weight::High,
            _ => Weight::Medium,
        }
    }
}

/// Confidence attached to a profile observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    #[serde(alias = "high")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

/// A salient event found by the significance lens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moment {
    pub quote: String,
    pub weight: Weight,
    pub category: Category,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub context_needed: String,
}

/// A recurring theme found by the pattern lens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(alias = "pattern")]
    pub description: String,
    /// Supporting quotes, in the order given
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub connects_to: Option<String>,
    #[serde(default)]
    pub implication: String,
}

/// Something learned about the person behind the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub aspect: String,
    pub observation: String,
    pub confidence: Confidence,
}

/// How new material relates to what the memory document says
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingType {
    /// A true conflict
    #[serde(alias = "contradiction")]
    Contradiction,
    /// A position that moved on; growth, not error
    #[serde(alias = "evolution")]
    Evolution,
    /// The stored understanding was wrong
    #[serde(alias = "correction")]
    Correction,
    /// The stored information no longer holds
    #[serde(alias = "outdated")]
    Outdated,
}

/// What to do about a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingAction {
    #[serde(alias = "update")]
    Update,
    #[serde(alias = "replace")]
    Replace,
    #[serde(alias = "flag_for_review")]
    FlagForReview,
}

/// A contradiction or evolution against prior context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionFinding {
    pub existing: String,
    pub new: String,
    #[serde(rename = "type")]
    pub kind: FindingType,
    #[serde(default)]
    pub resolution: String,
    pub action: FindingAction,
}

/// Fidelity chosen for storing a significant item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepresentationLevel {
    #[serde(alias = "verbatim")]
    Verbatim,
    #[serde(alias = "summary")]
    Summary,
    #[serde(alias = "principle")]
    Principle,
    #[serde(alias = "reference")]
    Reference,
}

/// How one moment should be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    pub original: String,
    pub level: RepresentationLevel,
    pub output: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Edit kind for the memory document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    #[serde(alias = "add")]
    Add,
    #[serde(alias = "update")]
    Update,
    #[serde(alias = "remove")]
    Remove,
}

/// A moment selected for the final update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMoment {
    pub content: String,
    pub category: Category,
    pub weight: Weight,
}

/// A proposed edit to one section of the memory document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChange {
    pub section: String,
    pub action: ChangeAction,
    pub content: String,
}

/// The reconciled update produced by a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_moments: Vec<KeyMoment>,
    #[serde(default)]
    pub pattern_updates: Vec<String>,
    #[serde(default)]
    pub context_changes: Vec<ContextChange>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl SynthesisResult {
    /// True when the result carries no content at all
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.key_moments.is_empty()
            && self.pattern_updates.is_empty()
            && self.context_changes.is_empty()
            && self.flags.is_empty()
    }
}

/// An item tagged with the chunk it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traced<T> {
    pub chunk_index: usize,
    #[serde(flatten)]
    pub item: T,
}

impl<T> Traced<T> {
    pub fn new(chunk_index: usize, item: T) -> Self {
        Self { chunk_index, item }
    }
}

// Wire schemas, one per lens

/// Significance lens response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignificanceResponse {
    #[serde(default)]
    pub moments: Vec<Moment>,
}

/// Pattern lens response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PatternResponse {
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default, alias = "user_profile_updates")]
    pub profile_updates: Vec<ProfileUpdate>,
}

/// Contradiction lens response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContradictionResponse {
    #[serde(default)]
    pub contradictions: Vec<ContradictionFinding>,
}

/// Compression lens response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompressionResponse {
    #[serde(default)]
    pub representations: Vec<Representation>,
}
