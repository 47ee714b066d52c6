//! LLM-backed relevance grader
//!
//! Asks the model for a binary `{"score": "yes" | "no"}` verdict in JSON mode
//! and validates the reply against that contract.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::crag::{GradeError, GraderStrictness, RelevanceGrade, RelevanceGrader};
use crate::domain::llm::{LlmProvider, LlmRequest};

/// Grades one document per model call
#[derive(Debug)]
pub struct LlmRelevanceGrader {
    provider: Arc<dyn LlmProvider>,
    model: String,
    strictness: GraderStrictness,
}

impl LlmRelevanceGrader {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            strictness: GraderStrictness::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: GraderStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Inserted text is never rescanned, so braces in documents survive as-is
    fn build_prompt(question: &str, document_text: &str) -> String {
        format!(
            "You are a grader assessing the relevance of a retrieved document to a user question.
Here is the retrieved document:
{document_text}

Here is the user question:
{question}

If the document contains keywords related to the user question, grade it as relevant.
Give a binary score 'yes' or 'no' to indicate whether the document is relevant to the question.
Provide the binary score as a JSON with a single key 'score' and no preamble or explanation.
Your output MUST be only the JSON object."
        )
    }
}

#[async_trait]
impl RelevanceGrader for LlmRelevanceGrader {
    async fn grade(
        &self,
        question: &str,
        document_text: &str,
    ) -> Result<RelevanceGrade, GradeError> {
        let request = LlmRequest::builder()
            .user(Self::build_prompt(question, document_text))
            .temperature(0.0)
            .json_output()
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        debug!(model = %self.model, output = response.content(), "Grader replied");

        RelevanceGrade::parse(response.content(), self.strictness)
    }

    fn grader_name(&self) -> &'static str {
        "llm"
    }
}
