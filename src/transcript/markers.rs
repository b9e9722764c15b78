//! Explicit importance markers
//!
//! Speakers sometimes say outright that something matters ("this is really
//! important", "don't forget"). Those blocks are flagged CRITICAL before any
//! lens runs, without inference.

use super::{Chunk, Transcript};
use crate::lens::types::Weight;
use serde::{Deserialize, Serialize};

/// A block that contains an explicit importance marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Block the marker was found in
    pub block_index: usize,
    /// Chunk containing that block
    pub chunk_index: usize,
    /// Speaker of the block, if any
    pub speaker: Option<String>,
    /// Phrase that matched
    pub phrase: String,
    /// Full block text
    pub content: String,
    /// Always CRITICAL
    pub weight: Weight,
}

/// Case-insensitive phrase scanner
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    phrases: Vec<String>,
}

impl MarkerScanner {
    /// Create a scanner for the given phrases
    pub fn new(phrases: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Scan every block; each block yields at most one marker.
    pub fn scan(&self, transcript: &Transcript, chunks: &[Chunk]) -> Vec<Marker> {
        let mut markers = Vec::new();

        for block in transcript.blocks() {
            let text = transcript.block_text(block);
            let lower = text.to_lowercase();
            let Some(phrase) = self.phrases.iter().find(|p| lower.contains(p.as_str())) else {
                continue;
            };

            let chunk_index = chunks
                .iter()
                .find(|c| c.blocks.contains(&block.index))
                .map(|c| c.index)
                .unwrap_or(0);

            markers.push(Marker {
                block_index: block.index,
                chunk_index,
                speaker: block.speaker.clone(),
                phrase: phrase.clone(),
                content: text.to_string(),
                weight: Weight::Critical,
            });
        }

        markers
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new(crate::config::default_marker_phrases())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Chunker;

    fn scan(text: &str, budget: usize) -> Vec<Marker> {
        let transcript = Transcript::parse("2026-03-01", text);
        let chunks = Chunker::new(budget).split(&transcript);
        MarkerScanner::default().scan(&transcript, &chunks)
    }

    #[test]
    fn test_really_important_flagged_critical() {
        let markers = scan("## Ana [09:00]\n\nOk so this is really important.\n", 8000);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].weight, Weight::Critical);
        assert_eq!(markers[0].phrase, "really important");
        assert_eq!(markers[0].speaker.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_case_insensitive() {
        let markers = scan("## Ana\nPAY ATTENTION here\n", 8000);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].phrase, "pay attention");
    }

    #[test]
    fn test_one_marker_per_block() {
        let markers = scan("## Ana\nthis is important, don't forget it, critical\n", 8000);
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn test_no_markers() {
        assert!(scan("## Ana\njust chatting\n## Bo\nsure\n", 8000).is_empty());
        assert!(scan("", 8000).is_empty());
    }

    #[test]
    fn test_marker_chunk_index() {
        let text = format!(
            "## Ana\n{}\n## Bo\n{}\n## Ana\nwe need to remember this\n",
            "a".repeat(100),
            "b".repeat(100)
        );
        let markers = scan(&text, 120);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].block_index, 2);
        assert_eq!(markers[0].chunk_index, 2);
    }

    #[test]
    fn test_custom_phrases() {
        let transcript = Transcript::parse("d", "## Ana\nremember the milk\n");
        let chunks = Chunker::default().split(&transcript);
        let scanner = MarkerScanner::new(["Remember", "  "]);
        let markers = scanner.scan(&transcript, &chunks);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].phrase, "remember");
    }
}
