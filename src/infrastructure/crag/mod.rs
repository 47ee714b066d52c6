//! CRAG (Corrective RAG) infrastructure implementations
//!
//! LLM-backed grading and generation, plus the pipeline that drives a request
//! through the state machine.

mod llm_generator;
mod llm_grader;
mod pipeline;

pub use llm_generator::LlmAnswerGenerator;
pub use llm_grader::LlmRelevanceGrader;
pub use pipeline::CragPipeline;
