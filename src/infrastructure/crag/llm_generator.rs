//! LLM-backed answer generator

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::crag::{AnswerGenerator, Document};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

/// Generates a concise answer grounded in the supplied documents
#[derive(Debug)]
pub struct LlmAnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl LlmAnswerGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Numbered document list; an empty list is stated explicitly so the
    /// model falls back to "don't know"
    fn format_documents(documents: &[Document]) -> String {
        if documents.is_empty() {
            return "(no documents)".to_string();
        }

        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| match doc.url() {
                Some(url) => format!("[{}] ({}) {}", i + 1, url, doc.content()),
                None => format!("[{}] {}", i + 1, doc.content()),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn build_prompt(question: &str, documents: &[Document]) -> String {
        let documents = Self::format_documents(documents);

        format!(
            "You are an assistant for question-answering tasks.

Use the following documents to answer the question.

If you don't know the answer, just say that you don't know.

Use three sentences maximum and keep the answer concise:
Question: {question}
Documents: {documents}
Answer:"
        )
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .user(Self::build_prompt(question, documents))
            .temperature(self.temperature)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        Ok(response.content().trim().to_string())
    }
}
