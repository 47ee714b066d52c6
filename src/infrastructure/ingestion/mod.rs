//! Document ingestion infrastructure
//!
//! Page fetching and text extraction, recursive chunking, and the pipeline
//! that embeds chunks into the persisted vector index.

mod html;
mod pipeline;
mod recursive;

pub use html::{HtmlExtractor, ParsedPage};
pub use pipeline::{IngestionPipeline, SOURCE_CHUNK_INDEX, SOURCE_TITLE};
pub use recursive::RecursiveChunker;
