//! Relevance grading contract
//!
//! A grader classifies one (question, document) pair and must answer with
//! exactly `{"score": "yes"}` or `{"score": "no"}`. Anything else is reported
//! as [`GradeError::MalformedOutput`], which the grading stage treats as "not
//! relevant".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

use crate::domain::DomainError;

/// Binary relevance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeScore {
    Yes,
    No,
}

/// Structured grader output: a single `score` field, nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelevanceGrade {
    pub score: GradeScore,
}

/// How much surrounding text is tolerated around the JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraderStrictness {
    /// The whole (trimmed) output must be the JSON object
    #[default]
    Strict,
    /// The first `{...}` span is extracted first, e.g. from a fenced block
    Lenient,
}

impl RelevanceGrade {
    pub fn yes() -> Self {
        Self {
            score: GradeScore::Yes,
        }
    }

    pub fn no() -> Self {
        Self {
            score: GradeScore::No,
        }
    }

    pub fn is_relevant(&self) -> bool {
        self.score == GradeScore::Yes
    }

    /// Parse raw model output under the structured-output contract
    pub fn parse(output: &str, strictness: GraderStrictness) -> Result<Self, GradeError> {
        let candidate = match strictness {
            GraderStrictness::Strict => output.trim(),
            GraderStrictness::Lenient => extract_json(output).unwrap_or(output),
        };

        serde_json::from_str(candidate)
            .map_err(|e| GradeError::malformed_output(output, e.to_string()))
    }
}

/// Extract the outermost JSON object from a string (handles markdown fences)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Errors returned by a grader for a single document
#[derive(Debug, Error)]
pub enum GradeError {
    /// Output did not match the contract; recoverable for the run
    #[error("Malformed grader output ({reason}): {output}")]
    MalformedOutput { output: String, reason: String },

    /// The grading model could not be reached; fatal for the run
    #[error(transparent)]
    Capability(#[from] DomainError),
}

impl GradeError {
    pub fn malformed_output(output: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            output: output.into(),
            reason: reason.into(),
        }
    }
}

/// Grading capability
#[async_trait]
pub trait RelevanceGrader: Send + Sync + Debug {
    /// Grade the relevance of one document to the question
    async fn grade(
        &self,
        question: &str,
        document_text: &str,
    ) -> Result<RelevanceGrade, GradeError>;

    /// Get the grader name
    fn grader_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_and_no() {
        let grade = RelevanceGrade::parse(r#"{"score": "yes"}"#, GraderStrictness::Strict).unwrap();
        assert!(grade.is_relevant());

        let grade = RelevanceGrade::parse(r#"{"score":"no"}"#, GraderStrictness::Strict).unwrap();
        assert!(!grade.is_relevant());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let grade =
            RelevanceGrade::parse("\n  {\"score\": \"yes\"}\n", GraderStrictness::Strict).unwrap();
        assert!(grade.is_relevant());
    }

    #[test]
    fn test_parse_rejects_unknown_score() {
        let err = RelevanceGrade::parse(r#"{"score": "maybe"}"#, GraderStrictness::Strict)
            .unwrap_err();
        assert!(matches!(err, GradeError::MalformedOutput { .. }));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(RelevanceGrade::parse(r#"{"score": "Yes"}"#, GraderStrictness::Strict).is_err());
    }

    #[test]
    fn test_parse_rejects_extra_fields() {
        let output = r#"{"score": "yes", "reason": "mentions agents"}"#;
        assert!(RelevanceGrade::parse(output, GraderStrictness::Strict).is_err());
        assert!(RelevanceGrade::parse(output, GraderStrictness::Lenient).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_score() {
        assert!(RelevanceGrade::parse("{}", GraderStrictness::Strict).is_err());
        assert!(RelevanceGrade::parse(r#"{"score": 1}"#, GraderStrictness::Strict).is_err());
    }

    #[test]
    fn test_strict_rejects_preamble() {
        let output = "Here is the grade: {\"score\": \"yes\"}";
        assert!(RelevanceGrade::parse(output, GraderStrictness::Strict).is_err());
    }

    #[test]
    fn test_lenient_extracts_fenced_json() {
        let output = "```json\n{\"score\": \"yes\"}\n```";
        let grade = RelevanceGrade::parse(output, GraderStrictness::Lenient).unwrap();
        assert!(grade.is_relevant());
    }

    #[test]
    fn test_not_json_at_all() {
        let err = RelevanceGrade::parse("yes", GraderStrictness::Lenient).unwrap_err();
        assert!(err.to_string().contains("Malformed grader output"));
    }

    #[test]
    fn test_extract_json_none() {
        assert!(extract_json("No JSON here").is_none());
        assert!(extract_json("} backwards {").is_none());
    }
}
