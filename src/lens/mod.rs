//! Analytical lenses
//!
//! A lens is a prompt template bound to one analytical role. Four of them
//! run over transcript chunks or accumulated findings; the synthesizer runs
//! once over everything.
//!
//! ```text
//! PromptTemplate ──render(Bindings, chunk)──▶ prompt
//!        prompt ──LensRunner (timeout, retries)──▶ raw text
//!      raw text ──parse_response──▶ LensOutput { Structured | Unstructured | Absent }
//! ```

pub mod parse;
pub mod prompts;
pub mod runner;
pub mod template;
pub mod types;

pub use parse::{extract_json, parse_response, CallStatus, LensOutput};
pub use prompts::PromptSet;
pub use runner::LensRunner;
pub use template::{Bindings, PromptTemplate, Slot};
pub use types::*;

use crate::store::Stage;

/// One analytical pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lens {
    Significance,
    Pattern,
    Contradiction,
    Compression,
    Synthesis,
}

impl Lens {
    /// Every lens, in execution order
    pub const ALL: [Lens; 5] = [
        Lens::Significance,
        Lens::Pattern,
        Lens::Contradiction,
        Lens::Compression,
        Lens::Synthesis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Lens::Significance => "significance",
            Lens::Pattern => "pattern",
            Lens::Contradiction => "contradiction",
            Lens::Compression => "compression",
            Lens::Synthesis => "synthesis",
        }
    }

    /// Stage under which this lens's output is persisted
    pub fn stage(&self) -> Stage {
        match self {
            Lens::Significance => Stage::Significance,
            Lens::Pattern => Stage::Patterns,
            Lens::Contradiction => Stage::Contradictions,
            Lens::Compression => Stage::Compression,
            Lens::Synthesis => Stage::Synthesis,
        }
    }
}

impl std::fmt::Display for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lens_stage_mapping() {
        let stages: Vec<Stage> = Lens::ALL.iter().map(|l| l.stage()).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Significance,
                Stage::Patterns,
                Stage::Contradictions,
                Stage::Compression,
                Stage::Synthesis,
            ]
        );
    }

    #[test]
    fn test_lens_display() {
        assert_eq!(Lens::Pattern.to_string(), "pattern");
        assert_eq!(format!("{}", Lens::Synthesis), "synthesis");
    }
}
