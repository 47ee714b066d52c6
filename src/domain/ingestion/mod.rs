//! Document ingestion domain: chunking and index-build configuration

mod chunker;
mod pipeline;

pub use chunker::{Chunk, ChunkingConfig, ChunkingStrategy};
pub use pipeline::{IngestionConfig, IngestionReport, DEFAULT_URLS};
