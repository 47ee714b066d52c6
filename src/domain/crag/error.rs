//! Request-level errors of the CRAG state machine

use thiserror::Error;

use super::state::Step;

/// Fatal errors that abort a CRAG run.
///
/// Per-document grading failures never appear here; the grading stage absorbs
/// them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CragError {
    #[error("Capability unavailable in stage '{stage}': {message}")]
    CapabilityUnavailable { stage: Step, message: String },

    #[error("Timeout in stage '{stage}' after {timeout_ms}ms")]
    Timeout { stage: Step, timeout_ms: u64 },

    #[error("Invalid routing: {0}")]
    InvalidRouting(String),

    #[error("Invalid transition in stage '{stage}': {message}")]
    InvalidTransition { stage: Step, message: String },
}

impl CragError {
    pub fn capability_unavailable(stage: Step, message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            stage,
            message: message.into(),
        }
    }

    pub fn timeout(stage: Step, timeout_ms: u64) -> Self {
        Self::Timeout { stage, timeout_ms }
    }

    pub fn invalid_routing(message: impl Into<String>) -> Self {
        Self::InvalidRouting(message.into())
    }

    pub fn invalid_transition(stage: Step, message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            stage,
            message: message.into(),
        }
    }

    /// The stage that failed, when the error is tied to one
    pub fn stage(&self) -> Option<Step> {
        match self {
            Self::CapabilityUnavailable { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::InvalidTransition { stage, .. } => Some(*stage),
            Self::InvalidRouting(_) => Some(Step::GradeDocumentRetrieval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CragError::capability_unavailable(Step::WebSearch, "connection refused");
        assert_eq!(
            err.to_string(),
            "Capability unavailable in stage 'web_search': connection refused"
        );

        let err = CragError::timeout(Step::GenerateAnswer, 5000);
        assert_eq!(
            err.to_string(),
            "Timeout in stage 'generate_answer' after 5000ms"
        );
    }

    #[test]
    fn test_error_stage() {
        let err = CragError::capability_unavailable(Step::RetrieveDocuments, "index missing");
        assert_eq!(err.stage(), Some(Step::RetrieveDocuments));

        let err = CragError::invalid_routing("unset");
        assert_eq!(err.stage(), Some(Step::GradeDocumentRetrieval));
    }
}
