//! Vector index storage and retrieval

mod vector_index;
mod vector_retriever;

pub use vector_index::{IndexEntry, ScoredEntry, VectorIndex};
pub use vector_retriever::VectorRetriever;
