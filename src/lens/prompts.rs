//! Built-in lens prompts
//!
//! The transcript is appended after each prompt by `PromptTemplate::render`,
//! so every chunked prompt ends with its input heading.

use super::template::PromptTemplate;
use super::Lens;

const SIGNIFICANCE: &str = r#"You are the Significance lens of a long-lived memory system.

Your role: find the moments in this conversation that MATTER.

Categories:
- ARCHITECTURE: how the system works, design decisions
- IDENTITY: what the user reveals about who they are, their values and priorities
- RELATIONSHIP: shifts in how the user and the assistant work together
- DISCOVERY: new insights and realizations
- EMOTIONAL: excitement, frustration, vulnerability
- DECISION: choices made, directions taken

Weights:
- CRITICAL: defines the shape of things, must be kept verbatim
- HIGH: needed for understanding, keep with context
- MEDIUM: useful but compressible
- LOW: routine, summarize heavily

Respond with JSON only:
{
  "moments": [
    {
      "quote": "exact quote or close paraphrase",
      "weight": "CRITICAL|HIGH|MEDIUM|LOW",
      "category": "ARCHITECTURE|IDENTITY|RELATIONSHIP|DISCOVERY|EMOTIONAL|DECISION",
      "why": "why this matters",
      "context_needed": "what is needed to understand it later"
    }
  ]
}

Be selective. Missing a MEDIUM moment is better than flooding memory with noise.

Conversation to analyze:"#;

const PATTERN: &str = r#"You are the Pattern lens of a long-lived memory system.

Your role: find PATTERNS and CONNECTIONS in this conversation.

Look for:
- RECURRING THEMES: topics that keep coming back
- VALUES: what the user cares about, stated or implied
- COMMUNICATION STYLE: how the user prefers to work and talk
- CONNECTIONS: links to earlier conversations or established context
- EVOLUTION: how positions and understanding have shifted

Respond with JSON only:
{
  "patterns": [
    {
      "description": "the pattern",
      "evidence": ["quote 1", "quote 2"],
      "connects_to": "existing context this relates to, or null",
      "implication": "what this means for understanding the user"
    }
  ],
  "profile_updates": [
    {
      "aspect": "which aspect of the user this reveals",
      "observation": "what was learned",
      "confidence": "HIGH|MEDIUM|LOW"
    }
  ]
}

Prefer patterns that persist over one-off remarks.

Conversation to analyze:"#;

const CONTRADICTION: &str = r#"You are the Contradiction lens of a long-lived memory system.

Your role: find what CONFLICTS with or UPDATES the existing memory document.

Classify each finding:
- CONTRADICTION: a true conflict with what the document says
- EVOLUTION: a position that has moved on; growth, not error
- CORRECTION: the document misunderstood something
- OUTDATED: the document holds information that no longer applies

An evolved position is EVOLUTION, never CONTRADICTION. People changing their
minds is growth. Only flag real conflicts or information that needs updating.

Respond with JSON only:
{
  "contradictions": [
    {
      "existing": "what the document currently says",
      "new": "what the conversation reveals",
      "type": "CONTRADICTION|EVOLUTION|CORRECTION|OUTDATED",
      "resolution": "how to reconcile the two",
      "action": "UPDATE|REPLACE|FLAG_FOR_REVIEW"
    }
  ]
}

Existing memory document:
{prior_context}

Findings from other lenses for this part of the conversation:
{chunk_highlights}

Conversation to analyze:"#;

const COMPRESSION: &str = r#"You are the Compression lens of a long-lived memory system.

Your role: decide HOW each significant moment should be stored.

Levels:
- VERBATIM: exact quote, no compression (unique phrasing, emotional peaks, architecture decisions)
- SUMMARY: condensed but faithful (important context, explanations, backstory)
- PRINCIPLE: the underlying rule or insight (things that generalize)
- REFERENCE: note that it happened, details not needed

Return exactly one representation per moment, in the order given.

Respond with JSON only:
{
  "representations": [
    {
      "original": "the moment",
      "level": "VERBATIM|SUMMARY|PRINCIPLE|REFERENCE",
      "output": "the representation to store",
      "reasoning": "why this level"
    }
  ]
}

Optimize for retrieval: what will be needed later to rebuild understanding?

Significant moments:"#;

const SYNTHESIS: &str = r#"You are the Synthesizer of a long-lived memory system.

You receive the outputs of the other lenses:
1. Markers - blocks the user explicitly flagged as important
2. Significance - which moments matter
3. Pattern - what connects to what
4. Contradiction - what conflicts with or updates the memory document
5. Compression - how to represent each moment

Your role: combine them into one coherent UPDATE for the memory document.

Respond with JSON only:
{
  "summary": "one or two sentences on what happened",
  "key_moments": [
    {
      "content": "the moment or insight to keep",
      "category": "ARCHITECTURE|IDENTITY|RELATIONSHIP|DISCOVERY|EMOTIONAL|DECISION",
      "weight": "CRITICAL|HIGH|MEDIUM|LOW"
    }
  ],
  "pattern_updates": ["observations to add to the user profile"],
  "context_changes": [
    {
      "section": "section of the memory document",
      "action": "ADD|UPDATE|REMOVE",
      "content": "what to add or change"
    }
  ],
  "flags": ["anything that needs human review"]
}

Priorities:
- {primary_subject} takes priority over {secondary_subject} when they compete for attention
- ARCHITECTURE moments are HIGH weight by default
- RELATIONSHIP moments are HIGH weight by default
- Routine operational work is MEDIUM weight by default

Lens outputs:
{agent_outputs}"#;

/// Default wording for the primary subject slot
pub const DEFAULT_PRIMARY_SUBJECT: &str = "The user's primary project";

/// Default wording for the secondary subject slot
pub const DEFAULT_SECONDARY_SUBJECT: &str = "secondary work";

/// One template per lens
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub significance: PromptTemplate,
    pub pattern: PromptTemplate,
    pub contradiction: PromptTemplate,
    pub compression: PromptTemplate,
    pub synthesis: PromptTemplate,
}

impl PromptSet {
    /// Template for a lens
    pub fn get(&self, lens: Lens) -> &PromptTemplate {
        match lens {
            Lens::Significance => &self.significance,
            Lens::Pattern => &self.pattern,
            Lens::Contradiction => &self.contradiction,
            Lens::Compression => &self.compression,
            Lens::Synthesis => &self.synthesis,
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            significance: PromptTemplate::new(Lens::Significance, SIGNIFICANCE),
            pattern: PromptTemplate::new(Lens::Pattern, PATTERN),
            contradiction: PromptTemplate::new(Lens::Contradiction, CONTRADICTION),
            compression: PromptTemplate::new(Lens::Compression, COMPRESSION),
            synthesis: PromptTemplate::new(Lens::Synthesis, SYNTHESIS),
        }
    }
}
