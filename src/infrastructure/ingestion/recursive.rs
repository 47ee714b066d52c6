//! Recursive chunking strategy

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Split levels, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Headers,
    Paragraphs,
    Lines,
    Sentences,
    Words,
}

impl Level {
    fn next(self) -> Option<Self> {
        match self {
            Self::Headers => Some(Self::Paragraphs),
            Self::Paragraphs => Some(Self::Lines),
            Self::Lines => Some(Self::Sentences),
            Self::Sentences => Some(Self::Words),
            Self::Words => None,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Headers | Self::Paragraphs => "\n\n",
            Self::Lines => "\n",
            Self::Sentences | Self::Words => " ",
        }
    }

    fn split(self, text: &str) -> Vec<&str> {
        let parts: Vec<&str> = match self {
            Self::Headers => split_by_headers(text),
            Self::Paragraphs => text.split("\n\n").collect(),
            Self::Lines => text.lines().collect(),
            Self::Sentences => text.unicode_sentences().collect(),
            Self::Words => text.split_whitespace().collect(),
        };

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Chunking strategy that recursively splits text hierarchically
///
/// Splitting order: headers -> paragraphs -> lines -> sentences -> words ->
/// characters. Sizes are measured in characters.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker
    pub fn new() -> Self {
        Self
    }

    fn split_recursive(text: &str, config: &ChunkingConfig, level: Level) -> Vec<String> {
        if char_len(text) <= config.chunk_size {
            return vec![text.to_string()];
        }

        let split_further = |part: &str| match level.next() {
            Some(next) => Self::split_recursive(part, config, next),
            None => hard_split(part, config.chunk_size),
        };

        let parts = level.split(text);

        if parts.len() <= 1 {
            return split_further(text);
        }

        let mut pieces = Vec::with_capacity(parts.len());
        for part in parts {
            if char_len(part) > config.chunk_size {
                pieces.extend(split_further(part));
            } else {
                pieces.push(part.to_string());
            }
        }

        merge(pieces, level.separator(), config)
    }
}

/// Greedily pack pieces into chunks, seeding each new chunk with the tail of
/// the previous one when an overlap is configured
fn merge(pieces: Vec<String>, separator: &str, config: &ChunkingConfig) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if current.is_empty() {
            current = piece;
            continue;
        }

        if char_len(&current) + separator_len + char_len(&piece) <= config.chunk_size {
            current.push_str(separator);
            current.push_str(&piece);
            continue;
        }

        let tail = overlap_tail(&current, config.chunk_overlap).to_string();
        chunks.push(std::mem::take(&mut current));

        current = if !tail.is_empty() && char_len(&tail) + 1 + char_len(&piece) <= config.chunk_size
        {
            format!("{} {}", tail, piece)
        } else {
            piece
        };
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Last `overlap` characters of `text`, starting on a word boundary
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }

    let total = char_len(text);
    if total <= overlap {
        return text;
    }

    let start = text
        .char_indices()
        .nth(total - overlap)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let tail = &text[start..];

    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start(),
        None => "",
    }
}

fn split_by_headers(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.starts_with('#') && offset > start {
            parts.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }

    parts.push(&text[start..]);
    parts
}

/// Last resort for unbroken runs longer than a chunk
fn hard_split(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size.max(1)).map(|c| c.iter().collect()).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let content = content.trim();

        if content.is_empty() {
            return Ok(vec![]);
        }

        let mut chunks: Vec<Chunk> = Self::split_recursive(content, config, Level::Headers)
            .into_iter()
            .map(|text| text.trim().to_string())
            .filter(|text| char_len(text) >= config.min_chunk_size)
            .enumerate()
            .map(|(index, text)| Chunk::new(text, index))
            .collect();

        // A short page still yields one chunk
        if chunks.is_empty() && char_len(content) <= config.chunk_size {
            chunks.push(Chunk::new(content, 0));
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}
