//! Domain layer - Core business logic and entities

pub mod crag;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod llm;

pub use crag::{
    AnswerGenerator, CragConfig, CragError, CragRequest, CragResponse, Document, RelevanceGrader,
    Retriever, RunState, Step, WebSearchProvider, WebSearchResult,
};
pub use embedding::{EmbeddingProvider, EmbeddingRequest};
pub use error::DomainError;
pub use ingestion::{Chunk, ChunkingConfig, ChunkingStrategy, IngestionConfig, IngestionReport};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, LlmResponseFormat,
    Message, MessageRole, Usage,
};
