//! CRAG (Corrective RAG) domain
//!
//! Types and capability traits for the corrective retrieval workflow: retrieve
//! documents, grade each one, fall back to a web search when any document is
//! rejected, then generate a grounded answer.

mod capability;
mod config;
mod document;
mod error;
mod grader;
mod state;

pub use capability::{AnswerGenerator, Retriever, WebSearchProvider, WebSearchResult};
pub use config::CragConfig;
pub use document::{Document, SOURCE_URL};
pub use error::CragError;
pub use grader::{GradeError, GradeScore, GraderStrictness, RelevanceGrade, RelevanceGrader};
pub use state::{CragRequest, CragResponse, NeedsSearch, Route, RunState, Step};

#[cfg(test)]
pub use capability::{MockAnswerGenerator, MockRetriever, MockWebSearchProvider};
#[cfg(test)]
pub use grader::mock::MockRelevanceGrader;
