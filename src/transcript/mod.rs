//! Transcript model: blocks, chunks, markers and input sources
//!
//! A transcript is one day's raw conversation log. It is split into
//! speaker blocks at `## ` headers; blocks are the only legal chunk
//! boundaries.

pub mod chunker;
pub mod markers;
pub mod source;

pub use chunker::{Chunk, Chunker};
pub use markers::{Marker, MarkerScanner};
pub use source::{ContextSource, FileContextSource, FileTranscriptSource, TranscriptSource};

use crate::error::{Error, Result};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Text that starts a new conversation block when it begins a line
pub const BLOCK_HEADER: &str = "## ";

/// One speaker turn (or the preamble before the first header)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Position in the transcript
    pub index: usize,
    /// Byte range in the transcript text
    pub range: Range<usize>,
    /// Speaker label from the header, `None` for a preamble
    pub speaker: Option<String>,
}

impl Block {
    /// Size of the block in bytes
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the block covers no bytes
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// A day's transcript, immutable for the duration of a run
#[derive(Debug, Clone)]
pub struct Transcript {
    date: String,
    text: String,
    blocks: Vec<Block>,
}

impl Transcript {
    /// Parse raw transcript text into blocks.
    ///
    /// The newline that precedes a header stays with the previous block, so
    /// concatenating every block in order yields `text` unchanged.
    pub fn parse(date: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut starts = vec![0];
        starts.extend(
            text.match_indices(&format!("\n{BLOCK_HEADER}"))
                .map(|(i, _)| i + 1),
        );

        let mut blocks = Vec::with_capacity(starts.len());
        if !text.is_empty() {
            for (index, &start) in starts.iter().enumerate() {
                let end = starts.get(index + 1).copied().unwrap_or(text.len());
                blocks.push(Block {
                    index,
                    speaker: speaker_of(&text[start..end]),
                    range: start..end,
                });
            }
        }

        Self {
            date: date.into(),
            text,
            blocks,
        }
    }

    /// Date key this transcript belongs to
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Full transcript text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All blocks in order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Text of a single block
    pub fn block_text(&self, block: &Block) -> &str {
        &self.text[block.range.clone()]
    }

    /// True when the transcript holds nothing worth analysing
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extract the speaker label from a block header line.
fn speaker_of(block: &str) -> Option<String> {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    let re = HEADER.get_or_init(|| {
        Regex::new(r"^## ([^\[(\n]+)").expect("header pattern is valid")
    });
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Validate a `YYYY-MM-DD` date key.
pub fn validate_date(date: &str) -> Result<()> {
    if date.len() != 10 {
        return Err(Error::InvalidDate(date.to_string()));
    }
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::InvalidDate(date.to_string()))
}
