//! Character-window chunking with a heading-aware markdown mode.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+ .*$").unwrap());

/// Splits text into overlapping character windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl Chunker {
    /// Create a chunker. An overlap at or above `chunk_size` is clamped to
    /// `chunk_size - 1` so every window advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let overlap = if chunk_size == 0 {
            0
        } else {
            overlap.min(chunk_size - 1)
        };
        Self { chunk_size, overlap }
    }

    /// Create a chunker from configuration.
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Window size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Effective overlap in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text`. Markdown (`md`, `markdown`) is first cut at heading
    /// lines, each heading staying with its body.
    pub fn split(&self, text: &str, file_type: Option<&str>) -> Vec<String> {
        let markdown = file_type
            .map(|ft| {
                let ft = ft.trim_start_matches('.').to_ascii_lowercase();
                ft == "md" || ft == "markdown"
            })
            .unwrap_or(false);

        if markdown {
            markdown_sections(text)
                .iter()
                .flat_map(|section| self.split_chars(section))
                .collect()
        } else {
            self.split_chars(text)
        }
    }

    /// Plain sliding window over characters.
    pub fn split_chars(&self, text: &str) -> Vec<String> {
        if self.chunk_size == 0 {
            return vec![text.to_string()];
        }

        // Byte offset of every char boundary, plus the end.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(text[bounds[start]..bounds[end]].to_string());
            if end == char_len {
                break;
            }
            start = end - self.overlap;
        }
        chunks
    }
}

/// Cut markdown into sections at `#`-heading lines.
///
/// Text before the first heading is its own section when it is not blank.
/// Each heading section is `heading + "\n" + body`.
fn markdown_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let headings: Vec<_> = HEADING_RE.find_iter(text).collect();

    let preamble_end = headings.first().map(|m| m.start()).unwrap_or(text.len());
    let preamble = &text[..preamble_end];
    if !preamble.trim().is_empty() {
        sections.push(preamble.to_string());
    }

    for (i, heading) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map(|m| m.start()).unwrap_or(text.len());
        let body = &text[heading.end()..body_end];
        sections.push(format!("{}\n{}", heading.as_str(), body));
    }
    sections
}
