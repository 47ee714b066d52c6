//! Run state threaded through the CRAG state machine

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::error::CragError;

/// Stage names recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    RetrieveDocuments,
    GradeDocumentRetrieval,
    WebSearch,
    GenerateAnswer,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetrieveDocuments => "retrieve_documents",
            Self::GradeDocumentRetrieval => "grade_document_retrieval",
            Self::WebSearch => "web_search",
            Self::GenerateAnswer => "generate_answer",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the graded document set must be supplemented by a web search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedsSearch {
    Yes,
    No,
}

impl NeedsSearch {
    /// One-way latch: once `Yes`, stays `Yes`.
    pub fn trip_if(self, dropped: bool) -> Self {
        if dropped { Self::Yes } else { self }
    }

    /// Fold per-document relevance verdicts into the latch
    pub fn from_verdicts<I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        verdicts
            .into_iter()
            .fold(Self::No, |latch, relevant| latch.trip_if(!relevant))
    }
}

/// Outgoing edge of the grading state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Search,
    Generate,
}

/// Input of one CRAG request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CragRequest {
    pub question: String,
}

impl CragRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// Output of a completed CRAG request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CragResponse {
    pub question: String,
    pub documents: Vec<Document>,
    pub answer: String,
    pub trace: Vec<Step>,
}

impl CragResponse {
    /// Whether the web search fallback ran
    pub fn searched(&self) -> bool {
        self.trace.contains(&Step::WebSearch)
    }
}

/// State of a single traversal of the state machine.
///
/// Every transition consumes the state and returns it with its own fields
/// updated and exactly one entry appended to the trace.
#[derive(Debug, Clone)]
pub struct RunState {
    question: String,
    documents: Vec<Document>,
    needs_search: Option<NeedsSearch>,
    answer: Option<String>,
    trace: Vec<Step>,
}

impl RunState {
    /// Start state: question set, everything else empty
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            needs_search: None,
            answer: None,
            trace: Vec::new(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn needs_search(&self) -> Option<NeedsSearch> {
        self.needs_search
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn trace(&self) -> &[Step] {
        &self.trace
    }

    /// Retrieve: documents set to the retrieved sequence
    pub fn retrieved(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self.trace.push(Step::RetrieveDocuments);
        self
    }

    /// Grade: documents replaced by the kept subsequence, latch recorded
    pub fn graded(
        mut self,
        kept: Vec<Document>,
        needs_search: NeedsSearch,
    ) -> Result<Self, CragError> {
        if self.needs_search.is_some() {
            return Err(CragError::invalid_transition(
                Step::GradeDocumentRetrieval,
                "needs_search already set",
            ));
        }

        self.documents = kept;
        self.needs_search = Some(needs_search);
        self.trace.push(Step::GradeDocumentRetrieval);
        Ok(self)
    }

    /// Search: results appended after the retained documents
    pub fn searched(mut self, results: Vec<Document>) -> Self {
        self.documents.extend(results);
        self.trace.push(Step::WebSearch);
        self
    }

    /// Generate: terminal, sets the answer exactly once
    pub fn answered(mut self, answer: impl Into<String>) -> Result<Self, CragError> {
        if self.answer.is_some() {
            return Err(CragError::invalid_transition(
                Step::GenerateAnswer,
                "answer already set",
            ));
        }

        self.answer = Some(answer.into());
        self.trace.push(Step::GenerateAnswer);
        Ok(self)
    }

    /// Branch decision after grading. Pure and total over `needs_search`.
    pub fn route(&self) -> Result<Route, CragError> {
        match self.needs_search {
            Some(NeedsSearch::Yes) => Ok(Route::Search),
            Some(NeedsSearch::No) => Ok(Route::Generate),
            None => Err(CragError::invalid_routing(
                "needs_search was never set by the grading stage",
            )),
        }
    }

    /// End state: only reachable once an answer exists
    pub fn into_response(self) -> Result<CragResponse, CragError> {
        let answer = self.answer.ok_or_else(|| {
            CragError::invalid_transition(Step::GenerateAnswer, "run ended without an answer")
        })?;

        Ok(CragResponse {
            question: self.question,
            documents: self.documents,
            answer,
            trace: self.trace,
        })
    }
}
