//! Infrastructure layer - Capability implementations and wiring helpers

pub mod crag;
pub mod embedding;
pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod retrieval;
pub mod web_search;
