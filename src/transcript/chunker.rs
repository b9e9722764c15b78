//! Block-aligned transcript chunking
//!
//! Blocks are packed greedily into chunks of at most `max_bytes`. A chunk
//! is closed only when the next block would overflow it and it already
//! holds something, so a single oversized block still becomes its own
//! chunk instead of being split or dropped.

use super::Transcript;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous run of transcript blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunk sequence
    pub index: usize,
    /// Block indices covered by this chunk
    pub blocks: Range<usize>,
    /// Byte range in the transcript text
    pub bytes: Range<usize>,
    /// Chunk text
    pub text: String,
}

/// Splits transcripts into bounded, block-aligned chunks
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_bytes: usize,
}

impl Chunker {
    /// Create a chunker with the given byte budget
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes: max_bytes.max(1),
        }
    }

    /// Byte budget per chunk
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Split a parsed transcript into chunks.
    pub fn split(&self, transcript: &Transcript) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut first_block = 0;
        let mut start = 0;
        let mut len = 0;

        for block in transcript.blocks() {
            if len > 0 && len + block.len() > self.max_bytes {
                chunks.push(self.close(transcript, chunks.len(), first_block..block.index, start));
                first_block = block.index;
                start = block.range.start;
                len = 0;
            }
            len += block.len();
        }

        if len > 0 {
            let end_block = transcript.blocks().len();
            chunks.push(self.close(transcript, chunks.len(), first_block..end_block, start));
        }

        chunks
    }

    /// Convenience wrapper for raw text
    pub fn split_text(&self, text: &str) -> Vec<Chunk> {
        self.split(&Transcript::parse("", text))
    }

    fn close(
        &self,
        transcript: &Transcript,
        index: usize,
        blocks: Range<usize>,
        start: usize,
    ) -> Chunk {
        let end = transcript.blocks()[blocks.end - 1].range.end;
        Chunk {
            index,
            blocks,
            bytes: start..end,
            text: transcript.text()[start..end].to_string(),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(8000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a transcript of `n` blocks with bodies of `body_len` bytes
    fn transcript(n: usize, body_len: usize) -> String {
        let mut text = String::from("# Conversations\n\n");
        for i in 0..n {
            let speaker = if i % 2 == 0 { "Ana" } else { "Assistant" };
            text.push_str(&format!("## {speaker} [10:{i:02}]\n\n"));
            text.push_str(&"x".repeat(body_len));
            text.push_str("\n\n---\n\n");
        }
        text
    }

    fn concat(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_roundtrip_many_sizes() {
        for blocks in [0, 1, 2, 7, 30] {
            for body in [0, 5, 120, 900] {
                for budget in [1, 50, 400, 8000] {
                    let text = transcript(blocks, body);
                    let chunks = Chunker::new(budget).split_text(&text);
                    assert_eq!(
                        concat(&chunks),
                        text,
                        "blocks={blocks} body={body} budget={budget}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_boundaries_on_block_starts() {
        let text = transcript(12, 200);
        let parsed = Transcript::parse("d", text.clone());
        let block_starts: Vec<usize> = parsed.blocks().iter().map(|b| b.range.start).collect();

        let chunks = Chunker::new(500).split(&parsed);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(block_starts.contains(&chunk.bytes.start));
            assert_eq!(chunk.text, &text[chunk.bytes.clone()]);
        }
    }

    #[test]
    fn test_budget_respected_unless_single_block() {
        let parsed = Transcript::parse("d", transcript(20, 150));
        let chunks = Chunker::new(600).split(&parsed);
        for chunk in &chunks {
            if chunk.blocks.len() > 1 {
                assert!(chunk.text.len() <= 600);
            }
        }
    }

    #[test]
    fn test_oversized_block_kept_whole() {
        let big = format!("## Ana\n{}\n", "y".repeat(5000));
        let text = format!("## Bo\nhi\n{big}## Bo\nbye\n");
        let chunks = Chunker::new(100).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, big);
        assert_eq!(concat(&chunks), text);
    }

    #[test]
    fn test_empty_yields_no_chunks() {
        assert!(Chunker::new(100).split_text("").is_empty());
    }

    #[test]
    fn test_chunk_indices_sequential() {
        let chunks = Chunker::new(300).split_text(&transcript(10, 100));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        // Block ranges tile the transcript without gaps
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].blocks.end, pair[1].blocks.start);
            assert_eq!(pair[0].bytes.end, pair[1].bytes.start);
        }
    }

    #[test]
    fn test_everything_fits_in_one_chunk() {
        let text = transcript(3, 10);
        let chunks = Chunker::default().split_text(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].blocks, 0..4);
    }
}
