//! CRAG pipeline implementation
//!
//! Drives one request through retrieve, grade, the search-or-generate branch
//! and generation. Capabilities are shared and read-only, so one pipeline can
//! serve concurrent runs.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::crag::{
    AnswerGenerator, CragConfig, CragError, CragRequest, CragResponse, Document, GradeError,
    NeedsSearch, RelevanceGrader, Retriever, Route, RunState, Step, WebSearchProvider,
};
use crate::domain::DomainError;

/// Corrective RAG state machine
pub struct CragPipeline {
    retriever: Arc<dyn Retriever>,
    grader: Arc<dyn RelevanceGrader>,
    web_search: Arc<dyn WebSearchProvider>,
    generator: Arc<dyn AnswerGenerator>,
    config: CragConfig,
}

impl fmt::Debug for CragPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CragPipeline")
            .field("grader", &self.grader.grader_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CragPipeline {
    /// Create a pipeline with the default configuration
    pub fn new(
        retriever: Arc<dyn Retriever>,
        grader: Arc<dyn RelevanceGrader>,
        web_search: Arc<dyn WebSearchProvider>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            retriever,
            grader,
            web_search,
            generator,
            config: CragConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CragConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CragConfig {
        &self.config
    }

    /// Answer one question. Returns the complete response or the first fatal
    /// error; partial state is discarded.
    pub async fn run(&self, request: CragRequest) -> Result<CragResponse, CragError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("crag_run", %run_id);

        self.execute(RunState::new(request.question))
            .instrument(span)
            .await
    }

    async fn execute(&self, state: RunState) -> Result<CragResponse, CragError> {
        info!(question = state.question(), "CRAG run started");

        let state = self.retrieve(state).await?;
        let state = self.grade(state).await?;

        let state = match state.route()? {
            Route::Search => self.search(state).await?,
            Route::Generate => state,
        };

        let state = self.generate(state).await?;
        let response = state.into_response()?;

        info!(
            documents = response.documents.len(),
            searched = response.searched(),
            steps = response.trace.len(),
            generated_without_documents = response.documents.is_empty(),
            "CRAG run complete"
        );

        Ok(response)
    }

    async fn retrieve(&self, state: RunState) -> Result<RunState, CragError> {
        let k = self.config.retrieve_k;

        let mut documents = self
            .bounded(
                Step::RetrieveDocuments,
                self.retriever.retrieve(state.question(), k),
            )
            .await?;
        documents.truncate(k);

        info!(retrieved = documents.len(), k, "Retrieved documents");

        Ok(state.retrieved(documents))
    }

    async fn grade(&self, state: RunState) -> Result<RunState, CragError> {
        let question = state.question();
        let concurrency = self.config.grading_concurrency.max(1);

        // `buffered` yields in input order regardless of completion order
        let verdicts: Vec<bool> = stream::iter(state.documents().iter().enumerate())
            .map(|(index, document)| self.grade_one(question, index, document))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let needs_search = NeedsSearch::from_verdicts(verdicts.iter().copied());
        let kept: Vec<Document> = state
            .documents()
            .iter()
            .zip(&verdicts)
            .filter(|(_, relevant)| **relevant)
            .map(|(document, _)| document.clone())
            .collect();

        info!(
            graded = verdicts.len(),
            kept = kept.len(),
            needs_search = ?needs_search,
            "Graded documents"
        );

        state.graded(kept, needs_search)
    }

    /// Grade a single document. Malformed output counts as "not relevant".
    async fn grade_one(
        &self,
        question: &str,
        index: usize,
        document: &Document,
    ) -> Result<bool, CragError> {
        let stage = Step::GradeDocumentRetrieval;
        let timeout_ms = self.config.call_timeout_ms;

        let outcome = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.grader.grade(question, document.content()),
        )
        .await
        .map_err(|_| CragError::timeout(stage, timeout_ms))?;

        match outcome {
            Ok(grade) => {
                debug!(index, relevant = grade.is_relevant(), "Document graded");
                Ok(grade.is_relevant())
            }
            Err(GradeError::MalformedOutput { output, reason }) => {
                warn!(index, %reason, %output, "Malformed grader output, dropping document");
                Ok(false)
            }
            Err(GradeError::Capability(e)) => {
                Err(CragError::capability_unavailable(stage, e.to_string()))
            }
        }
    }

    async fn search(&self, state: RunState) -> Result<RunState, CragError> {
        let k = self.config.search_k;

        let results = self
            .bounded(Step::WebSearch, self.web_search.search(state.question(), k))
            .await?;

        let documents: Vec<Document> = results
            .into_iter()
            .take(k)
            .map(|result| result.into_document())
            .collect();

        info!(results = documents.len(), k, "Web search supplemented documents");

        Ok(state.searched(documents))
    }

    async fn generate(&self, state: RunState) -> Result<RunState, CragError> {
        if state.documents().is_empty() {
            info!(documents = 0, "Generating without supporting documents");
        } else {
            debug!(documents = state.documents().len(), "Generating answer");
        }

        let answer = self
            .bounded(
                Step::GenerateAnswer,
                self.generator.generate(state.question(), state.documents()),
            )
            .await?;

        state.answered(answer)
    }

    /// Run one external call under the configured timeout
    async fn bounded<T, F>(&self, stage: Step, call: F) -> Result<T, CragError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let timeout_ms = self.config.call_timeout_ms;

        match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(%stage, error = %e, "Capability call failed");
                Err(CragError::capability_unavailable(stage, e.to_string()))
            }
            Err(_) => {
                warn!(%stage, timeout_ms, "Capability call timed out");
                Err(CragError::timeout(stage, timeout_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::crag::{
        MockAnswerGenerator, MockRelevanceGrader, MockRetriever, MockWebSearchProvider,
        RelevanceGrade, WebSearchResult,
    };
    use crate::infrastructure::logging::capture::capture_logs;

    const QUESTION: &str = "What are the types of agent memory?";

    fn docs(names: &[&str]) -> Vec<Document> {
        names.iter().map(|n| Document::new(*n)).collect()
    }

    fn contents(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.content()).collect()
    }

    fn retriever_returning(documents: Vec<Document>) -> MockRetriever {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .times(1)
            .returning(move |question, k| {
                assert_eq!(question, QUESTION);
                assert_eq!(k, 4);
                Ok(documents.clone())
            });
        retriever
    }

    fn search_never_called() -> MockWebSearchProvider {
        let mut search = MockWebSearchProvider::new();
        search.expect_search().never();
        search
    }

    fn search_returning(results: Vec<WebSearchResult>) -> MockWebSearchProvider {
        let mut search = MockWebSearchProvider::new();
        search
            .expect_search()
            .times(1)
            .returning(move |query, k| {
                assert_eq!(query, QUESTION);
                assert_eq!(k, 3);
                Ok(results.clone())
            });
        search
    }

    fn echo_generator() -> MockAnswerGenerator {
        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, documents| Ok(format!("answer from {} documents", documents.len())));
        generator
    }

    fn pipeline(
        retriever: MockRetriever,
        grader: MockRelevanceGrader,
        search: MockWebSearchProvider,
        generator: MockAnswerGenerator,
    ) -> CragPipeline {
        CragPipeline::new(
            Arc::new(retriever),
            Arc::new(grader),
            Arc::new(search),
            Arc::new(generator),
        )
    }

    fn web_results() -> Vec<WebSearchResult> {
        vec![
            WebSearchResult::new("web one", "https://a.example"),
            WebSearchResult::new("web two", "https://b.example"),
            WebSearchResult::new("web three", "https://c.example"),
        ]
    }

    #[tokio::test]
    async fn test_all_relevant_skips_search() {
        let pipeline = pipeline(
            retriever_returning(docs(&["d1", "d2", "d3", "d4"])),
            MockRelevanceGrader::new(),
            search_never_called(),
            echo_generator(),
        );

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(response.question, QUESTION);
        assert_eq!(contents(&response.documents), vec!["d1", "d2", "d3", "d4"]);
        assert_eq!(response.answer, "answer from 4 documents");
        assert_eq!(
            response.trace,
            vec![
                Step::RetrieveDocuments,
                Step::GradeDocumentRetrieval,
                Step::GenerateAnswer
            ]
        );
        assert!(!response.searched());
    }

    #[tokio::test]
    async fn test_partial_relevance_triggers_search() {
        let grader = MockRelevanceGrader::new()
            .with_output("d2", r#"{"score": "no"}"#)
            .with_output("d4", r#"{"score": "no"}"#);

        let pipeline = pipeline(
            retriever_returning(docs(&["d1", "d2", "d3", "d4"])),
            grader,
            search_returning(web_results()),
            echo_generator(),
        );

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(
            contents(&response.documents),
            vec!["d1", "d3", "web one", "web two", "web three"]
        );
        assert_eq!(response.documents[2].url(), Some("https://a.example"));
        assert!(response.documents[0].url().is_none());
        assert_eq!(response.answer, "answer from 5 documents");
        assert_eq!(
            response.trace,
            vec![
                Step::RetrieveDocuments,
                Step::GradeDocumentRetrieval,
                Step::WebSearch,
                Step::GenerateAnswer
            ]
        );
    }

    #[tokio::test]
    async fn test_search_results_capped_at_k() {
        let mut results = web_results();
        results.push(WebSearchResult::new("web four", "https://d.example"));

        let pipeline = pipeline(
            retriever_returning(docs(&["d1"])),
            MockRelevanceGrader::new().with_output("d1", r#"{"score": "no"}"#),
            search_returning(results),
            echo_generator(),
        );

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(
            contents(&response.documents),
            vec!["web one", "web two", "web three"]
        );
    }

    #[tokio::test]
    async fn test_empty_retrieval_generates_without_documents() {
        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, documents| {
                assert!(documents.is_empty());
                Ok("I don't know.".to_string())
            });

        let pipeline = pipeline(
            retriever_returning(Vec::new()),
            MockRelevanceGrader::new().with_error("grader must not be called"),
            search_never_called(),
            generator,
        );

        let (logs, _guard) = capture_logs();
        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert!(response.documents.is_empty());
        assert_eq!(response.answer, "I don't know.");
        assert_eq!(response.trace.len(), 3);

        let logs = logs.contents();
        assert!(logs.contains("CRAG run complete"));
        assert!(logs.contains(r#""generated_without_documents":true"#));
    }

    #[tokio::test]
    async fn test_unknown_score_drops_document_and_searches() {
        let grader = MockRelevanceGrader::new().with_output("d3", r#"{"score": "maybe"}"#);

        let pipeline = pipeline(
            retriever_returning(docs(&["d1", "d2", "d3", "d4"])),
            grader,
            search_returning(Vec::new()),
            echo_generator(),
        );

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(contents(&response.documents), vec!["d1", "d2", "d4"]);
        assert!(response.searched());
    }

    #[tokio::test]
    async fn test_garbage_grader_output_is_not_fatal() {
        let grader = MockRelevanceGrader::new()
            .with_output("d1", "I think this one is relevant")
            .with_output("d2", r#"{"score": "yes", "why": "keywords"}"#);

        let pipeline = pipeline(
            retriever_returning(docs(&["d1", "d2"])),
            grader,
            search_returning(web_results()),
            echo_generator(),
        );

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(
            contents(&response.documents),
            vec!["web one", "web two", "web three"]
        );
    }

    #[tokio::test]
    async fn test_web_search_failure_is_fatal() {
        let mut search = MockWebSearchProvider::new();
        search
            .expect_search()
            .times(1)
            .returning(|_, _| Err(DomainError::provider("tavily", "connection refused")));

        let mut generator = MockAnswerGenerator::new();
        generator.expect_generate().never();

        let pipeline = pipeline(
            retriever_returning(docs(&["d1", "d2"])),
            MockRelevanceGrader::new().with_output("d1", r#"{"score": "no"}"#),
            search,
            generator,
        );

        let err = pipeline.run(CragRequest::new(QUESTION)).await.unwrap_err();

        assert_eq!(err.stage(), Some(Step::WebSearch));
        match err {
            CragError::CapabilityUnavailable { stage, message } => {
                assert_eq!(stage, Step::WebSearch);
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retriever_failure_is_fatal() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_, _| Err(DomainError::storage("index not found")));

        let mut generator = MockAnswerGenerator::new();
        generator.expect_generate().never();

        let pipeline = pipeline(
            retriever,
            MockRelevanceGrader::new(),
            search_never_called(),
            generator,
        );

        let err = pipeline.run(CragRequest::new(QUESTION)).await.unwrap_err();
        assert_eq!(err.stage(), Some(Step::RetrieveDocuments));
    }

    #[tokio::test]
    async fn test_grader_outage_is_fatal() {
        let pipeline = pipeline(
            retriever_returning(docs(&["d1"])),
            MockRelevanceGrader::new().with_error("model not loaded"),
            search_never_called(),
            {
                let mut generator = MockAnswerGenerator::new();
                generator.expect_generate().never();
                generator
            },
        );

        let err = pipeline.run(CragRequest::new(QUESTION)).await.unwrap_err();

        assert!(matches!(
            err,
            CragError::CapabilityUnavailable {
                stage: Step::GradeDocumentRetrieval,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_is_fatal() {
        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(DomainError::provider("ollama", "model not found")));

        let pipeline = pipeline(
            retriever_returning(docs(&["d1"])),
            MockRelevanceGrader::new(),
            search_never_called(),
            generator,
        );

        let err = pipeline.run(CragRequest::new(QUESTION)).await.unwrap_err();
        assert_eq!(err.stage(), Some(Step::GenerateAnswer));
    }

    #[derive(Debug)]
    struct SlowRetriever;

    #[async_trait]
    impl Retriever for SlowRetriever {
        async fn retrieve(&self, _question: &str, _k: usize) -> Result<Vec<Document>, DomainError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout_names_stage() {
        let pipeline = CragPipeline::new(
            Arc::new(SlowRetriever),
            Arc::new(MockRelevanceGrader::new()),
            Arc::new(search_never_called()),
            Arc::new(MockAnswerGenerator::new()),
        )
        .with_config(CragConfig::new().with_call_timeout_ms(20));

        let err = pipeline.run(CragRequest::new(QUESTION)).await.unwrap_err();

        assert_eq!(err, CragError::timeout(Step::RetrieveDocuments, 20));
    }

    /// Grader whose latency decreases with position, so later documents
    /// finish first under parallel grading
    #[derive(Debug)]
    struct StaggeredGrader;

    #[async_trait]
    impl RelevanceGrader for StaggeredGrader {
        async fn grade(
            &self,
            _question: &str,
            document_text: &str,
        ) -> Result<RelevanceGrade, GradeError> {
            let position: u64 = document_text.trim_start_matches('d').parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - position * 10)).await;

            if position % 2 == 0 {
                Ok(RelevanceGrade::no())
            } else {
                Ok(RelevanceGrade::yes())
            }
        }

        fn grader_name(&self) -> &'static str {
            "staggered"
        }
    }

    #[tokio::test]
    async fn test_parallel_grading_preserves_order() {
        let pipeline = CragPipeline::new(
            Arc::new(retriever_returning(docs(&["d1", "d2", "d3", "d4"]))),
            Arc::new(StaggeredGrader),
            Arc::new(search_returning(Vec::new())),
            Arc::new(echo_generator()),
        )
        .with_config(CragConfig::new().with_grading_concurrency(4));

        let response = pipeline.run(CragRequest::new(QUESTION)).await.unwrap();

        assert_eq!(contents(&response.documents), vec!["d1", "d3"]);
        assert!(response.searched());
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_pipeline() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .times(2)
            .returning(|question, _| Ok(vec![Document::new(format!("about {}", question))]));

        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .times(2)
            .returning(|question, _| Ok(format!("answer to {}", question)));

        let pipeline = pipeline(
            retriever,
            MockRelevanceGrader::new(),
            search_never_called(),
            generator,
        );

        let (first, second) = tokio::join!(
            pipeline.run(CragRequest::new("first")),
            pipeline.run(CragRequest::new("second")),
        );

        assert_eq!(first.unwrap().answer, "answer to first");
        assert_eq!(second.unwrap().answer, "answer to second");
    }

    #[test]
    fn test_debug_hides_capabilities() {
        let pipeline = pipeline(
            MockRetriever::new(),
            MockRelevanceGrader::new(),
            MockWebSearchProvider::new(),
            MockAnswerGenerator::new(),
        );

        let debug = format!("{:?}", pipeline);
        assert!(debug.contains("CragPipeline"));
        assert!(debug.contains("grader: \"mock\""));
    }
}
