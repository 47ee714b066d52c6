use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    DomainError, FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmResponseFormat, Message,
    MessageRole, Usage,
};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";

/// Ollama chat provider (`/api/chat`, non-streaming)
#[derive(Debug)]
pub struct OllamaProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn build_request(&self, model: &str, request: &LlmRequest) -> serde_json::Value {
        let messages: Vec<OllamaMessage> =
            request.messages.iter().map(OllamaMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        if request.response_format == LlmResponseFormat::JsonObject {
            body["format"] = serde_json::json!("json");
        }

        let mut options = serde_json::Map::new();

        if let Some(temp) = request.temperature {
            options.insert("temperature".to_string(), serde_json::json!(temp));
        }

        if let Some(max_tokens) = request.max_tokens {
            options.insert("num_predict".to_string(), serde_json::json!(max_tokens));
        }

        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![("Content-Type", "application/json")]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, DomainError> {
        let response: OllamaResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("ollama", format!("Failed to parse response: {}", e))
        })?;

        let id = response.created_at.unwrap_or_default();
        let message = Message::assistant(response.message.content);

        let mut llm_response = LlmResponse::new(id, response.model, message);

        if let Some(reason) = response.done_reason {
            llm_response = llm_response.with_finish_reason(parse_done_reason(&reason));
        }

        if let (Some(prompt), Some(completion)) = (response.prompt_eval_count, response.eval_count)
        {
            llm_response = llm_response.with_usage(Usage::new(prompt, completion));
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OllamaProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.chat_url();
        let body = self.build_request(model, &request);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

fn parse_done_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        _ => FinishReason::Stop,
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

impl OllamaMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: message.content_text().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    created_at: Option<String>,
    message: OllamaResponseMessage,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "http://127.0.0.1:11434/api/chat";

    fn chat_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "llama3:8b",
            "created_at": "2026-01-01T00:00:00Z",
            "message": { "role": "assistant", "content": content },
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 42,
            "eval_count": 7
        })
    }

    #[tokio::test]
    async fn test_ollama_chat() {
        let client = MockHttpClient::new().with_response(TEST_URL, chat_response("Hi there"));
        let provider = OllamaProvider::new(client);

        let request = LlmRequest::builder().user("Hello!").build();
        let response = provider.chat("llama3:8b", request).await.unwrap();

        assert_eq!(response.model, "llama3:8b");
        assert_eq!(response.content(), "Hi there");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));

        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 42);
        assert_eq!(usage.completion_tokens, 7);
    }

    #[test]
    fn test_build_request_json_mode() {
        let provider = OllamaProvider::new(MockHttpClient::new());
        let request = LlmRequest::builder()
            .system("grader")
            .user("doc")
            .temperature(0.0)
            .json_output()
            .build();

        let body = provider.build_request("llama3:8b", &request);

        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "doc");
    }

    #[test]
    fn test_build_request_text_mode_has_no_format() {
        let provider = OllamaProvider::new(MockHttpClient::new());
        let request = LlmRequest::builder().user("hello").max_tokens(64).build();

        let body = provider.build_request("llama3:8b", &request);

        assert!(body.get("format").is_none());
        assert_eq!(body["options"]["num_predict"], 64);
    }

    #[tokio::test]
    async fn test_ollama_custom_base_url() {
        let client = MockHttpClient::new()
            .with_response("http://gpu-box:11434/api/chat", chat_response("remote"));
        let provider = OllamaProvider::with_base_url(client, "http://gpu-box:11434/");

        let request = LlmRequest::builder().user("Test").build();
        let response = provider.chat("llama3:8b", request).await.unwrap();

        assert_eq!(response.content(), "remote");
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = OllamaProvider::new(client);

        let request = LlmRequest::builder().user("Hello!").build();
        let err = provider.chat("llama3:8b", request).await.unwrap_err();

        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_ollama_malformed_response() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"oops": 1}));
        let provider = OllamaProvider::new(client);

        let request = LlmRequest::builder().user("Hello!").build();
        assert!(provider.chat("llama3:8b", request).await.is_err());
    }
}
