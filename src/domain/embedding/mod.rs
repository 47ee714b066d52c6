//! Embedding provider domain models and traits

mod provider;
mod vector;

pub use provider::{EmbeddingProvider, EmbeddingRequest};
pub use vector::cosine_similarity;

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
