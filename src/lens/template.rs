//! Prompt templates with named slots
//!
//! Slots are written as `{slot_name}` in the template text. Rendering is a
//! single left-to-right pass, so a bound value that happens to contain a
//! slot token (a transcript quoting `{prior_context}`, say) is never
//! expanded a second time. Braces that do not form a known slot token (the
//! JSON examples inside the prompts) are left alone.

use super::Lens;
use std::collections::HashMap;

/// Named placeholder inside a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Persisted memory document
    PriorContext,
    /// Earlier lens findings attributed to the current chunk
    ChunkHighlights,
    /// Serialized outputs of every earlier lens
    AgentOutputs,
    /// Subject that wins when two compete for attention
    PrimarySubject,
    /// Subject that yields to the primary one
    SecondarySubject,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::PriorContext,
        Slot::ChunkHighlights,
        Slot::AgentOutputs,
        Slot::PrimarySubject,
        Slot::SecondarySubject,
    ];

    /// Token as it appears in template text
    pub fn token(&self) -> &'static str {
        match self {
            Slot::PriorContext => "{prior_context}",
            Slot::ChunkHighlights => "{chunk_highlights}",
            Slot::AgentOutputs => "{agent_outputs}",
            Slot::PrimarySubject => "{primary_subject}",
            Slot::SecondarySubject => "{secondary_subject}",
        }
    }
}

/// Values for the slots of one render
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<Slot, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a slot
    pub fn with(mut self, slot: Slot, value: impl Into<String>) -> Self {
        self.values.insert(slot, value.into());
        self
    }

    /// Value bound to a slot
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }
}

/// A lens prompt with named slots
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    lens: Lens,
    text: String,
}

impl PromptTemplate {
    pub fn new(lens: Lens, text: impl Into<String>) -> Self {
        Self {
            lens,
            text: text.into(),
        }
    }

    /// Lens this template drives
    pub fn lens(&self) -> Lens {
        self.lens
    }

    /// Raw template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Slots referenced by the template, in `Slot::ALL` order
    pub fn slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|s| self.text.contains(s.token()))
            .collect()
    }

    /// Substitute bound slots and append the input text.
    ///
    /// Unbound slots render as empty strings. The input is separated from
    /// the template by a blank line and omitted entirely when empty.
    pub fn render(&self, bindings: &Bindings, input: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + input.len() + 2);
        let mut rest = self.text.as_str();

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match Slot::ALL.iter().find(|s| tail.starts_with(s.token())) {
                Some(slot) => {
                    match bindings.get(*slot) {
                        Some(value) => out.push_str(value),
                        None => tracing::debug!(
                            lens = %self.lens,
                            slot = slot.token(),
                            "Rendering unbound prompt slot as empty"
                        ),
                    }
                    rest = &tail[slot.token().len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);

        if !input.is_empty() {
            out.push_str("\n\n");
            out.push_str(input);
        }
        out
    }
}
