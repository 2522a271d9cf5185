//! AI backend abstraction.
//!
//! Supports multiple AI backends:
//! - Remote: Amazon Bedrock (default), Anthropic
//! - Local: Ollama

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sigv4::{self, AwsCredentials, SigningRequest};
use super::AgentError;
use crate::config::{AiConfig, BackendKind};

/// A message in a conversation with the AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
        }
    }
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to the AI backend.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Messages in the Anthropic `messages` array shape.
    fn anthropic_messages(&self) -> Vec<AnthropicMessage> {
        self.messages
            .iter()
            .map(|msg| AnthropicMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

/// Response from the AI backend.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for AI backends.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Check if the backend is available.
    async fn health_check(&self) -> Result<bool, AgentError>;
}

fn build_client(timeout_seconds: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .expect("Failed to build HTTP client")
}

// --- Anthropic message format (shared by Bedrock) ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    fn into_chat_response(self, fallback_model: &str) -> ChatResponse {
        let content = self
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        let tokens_used = self.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let model = if self.model.is_empty() {
            fallback_model.to_string()
        } else {
            self.model
        };

        ChatResponse {
            content,
            model,
            tokens_used,
        }
    }
}

async fn read_anthropic_body(
    response: reqwest::Response,
    service: &str,
) -> Result<AnthropicResponse, AgentError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AgentError::BackendUnavailable(format!(
            "{} returned {}: {}",
            service, status, body
        )));
    }

    let body_text = response
        .text()
        .await
        .map_err(|e| AgentError::ResponseParseError(e.to_string()))?;

    serde_json::from_str::<AnthropicResponse>(&body_text).map_err(|e| {
        warn!(
            "Failed to parse {} response: {}. Body: {}",
            service,
            e,
            body_text.chars().take(500).collect::<String>()
        );
        AgentError::ResponseParseError(format!("Invalid JSON from {}: {}", service, e))
    })
}

// --- Bedrock backend ---

const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const BEDROCK_SERVICE: &str = "bedrock";

#[derive(Debug, Serialize)]
struct BedrockRequest {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Amazon Bedrock runtime backend, Anthropic models via `InvokeModel`.
pub struct BedrockBackend {
    client: reqwest::Client,
    credentials: AwsCredentials,
    model: String,
}

impl BedrockBackend {
    pub fn new(credentials: AwsCredentials, model: String, timeout_seconds: u64) -> Self {
        Self {
            client: build_client(timeout_seconds),
            credentials,
            model,
        }
    }

    pub fn from_env(model: String, timeout_seconds: u64) -> Result<Self, AgentError> {
        let credentials = AwsCredentials::from_env()?;
        Ok(Self::new(credentials, model, timeout_seconds))
    }

    fn host(&self) -> String {
        format!("bedrock-runtime.{}.amazonaws.com", self.credentials.region)
    }

    fn invoke_path(&self) -> String {
        format!("/model/{}/invoke", sigv4::uri_encode(&self.model))
    }
}

#[async_trait]
impl AiBackend for BedrockBackend {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let max_tokens = request.max_tokens.unwrap_or(2000);

        let body = serde_json::to_vec(&BedrockRequest {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens,
            messages: request.anthropic_messages(),
            temperature: request.temperature,
            top_p: request.top_p,
        })
        .map_err(|e| AgentError::BackendUnavailable(format!("Failed to encode request: {}", e)))?;

        let host = self.host();
        let path = self.invoke_path();
        let headers = sigv4::sign(
            &self.credentials,
            BEDROCK_SERVICE,
            &SigningRequest {
                method: "POST",
                host: &host,
                path: &path,
                content_type: "application/json",
                payload: &body,
            },
            chrono::Utc::now(),
        );

        let url = format!("https://{}{}", host, path);
        debug!("Sending request to Bedrock: {}", url);

        let mut builder = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "application/json");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        let parsed = read_anthropic_body(response, "Bedrock").await?;
        Ok(parsed.into_chat_response(&self.model))
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        // Bedrock has no unauthenticated health endpoint; credentials were
        // present at construction.
        Ok(true)
    }
}

// --- Anthropic backend ---

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Anthropic API backend implementation.
pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String, base_url: String, model: String, timeout_seconds: u64) -> Self {
        Self {
            client: build_client(timeout_seconds),
            base_url,
            model,
            api_key,
        }
    }

    pub fn from_env(base_url: String, model: String, timeout_seconds: u64) -> Result<Self, AgentError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            AgentError::BackendUnavailable("ANTHROPIC_API_KEY env var not set".to_string())
        })?;
        Ok(Self::new(api_key, base_url, model, timeout_seconds))
    }
}

#[async_trait]
impl AiBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let max_tokens = request.max_tokens.unwrap_or(2000);

        let anthropic_request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens,
            messages: request.anthropic_messages(),
            temperature: request.temperature,
            top_p: request.top_p,
        };

        debug!("Sending request to Anthropic API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        let parsed = read_anthropic_body(response, "Anthropic API").await?;
        Ok(parsed.into_chat_response(&self.model))
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        // Anthropic has no health endpoint; assume available if key is set
        Ok(true)
    }
}

// --- Ollama backend ---

/// Ollama backend implementation.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String, timeout_seconds: u64) -> Self {
        Self {
            client: build_client(timeout_seconds),
            base_url,
            model,
        }
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl AiBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let messages: Vec<OllamaMessage> = request
            .messages
            .into_iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content,
            })
            .collect();

        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
        };

        debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::BackendUnavailable(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParseError(e.to_string()))?;

        let tokens_used = match (
            ollama_response.prompt_eval_count,
            ollama_response.eval_count,
        ) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        Ok(ChatResponse {
            content: ollama_response.message.content,
            model: ollama_response.model,
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Create an AI backend from configuration.
///
/// Remote backends read their credentials from the environment here, once,
/// at startup.
pub fn create_backend(config: &AiConfig) -> Result<Arc<dyn AiBackend>, AgentError> {
    let backend: Arc<dyn AiBackend> = match config.backend {
        BackendKind::Bedrock => {
            info!("Using Bedrock backend ({})", config.model);
            Arc::new(BedrockBackend::from_env(
                config.model.clone(),
                config.timeout_seconds,
            )?)
        }
        BackendKind::Anthropic => {
            info!("Using Anthropic backend ({})", config.model);
            Arc::new(AnthropicBackend::from_env(
                config.base_url.clone(),
                config.model.clone(),
                config.timeout_seconds,
            )?)
        }
        BackendKind::Ollama => {
            info!("Using Ollama backend ({})", config.model);
            Arc::new(OllamaBackend::new(
                config.base_url.clone(),
                config.model.clone(),
                config.timeout_seconds,
            ))
        }
    };
    Ok(backend)
}

/// Mock backend for testing.
#[cfg(test)]
pub struct MockBackend {
    response: Result<String, String>,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every call fails as unavailable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl AiBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        // Whitespace-separated words stand in for tokens.
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count() as u32)
            .sum();
        self.requests.lock().unwrap().push(request);
        match &self.response {
            Ok(content) => {
                let completion_tokens = content.split_whitespace().count() as u32;
                Ok(ChatResponse {
                    content: content.clone(),
                    model: "mock".to_string(),
                    tokens_used: Some(TokenUsage {
                        prompt_tokens,
                        completion_tokens,
                        total_tokens: prompt_tokens + completion_tokens,
                    }),
                })
            }
            Err(message) => Err(AgentError::BackendUnavailable(message.clone())),
        }
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        Ok(self.response.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructor() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("Test")])
            .with_temperature(0.3)
            .with_top_p(0.9)
            .with_max_tokens(2000);

        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.top_p, Some(0.9));
        assert_eq!(request.max_tokens, Some(2000));
    }

    #[test]
    fn test_anthropic_messages() {
        let request = ChatRequest::new(vec![ChatMessage::user("hello")]);
        let messages = request.anthropic_messages();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("**PLAYER: TenZ**");

        let request = ChatRequest::new(vec![ChatMessage::user("Test")]);
        let response = backend.chat(request).await.unwrap();

        assert_eq!(response.content, "**PLAYER: TenZ**");
        assert!(backend.health_check().await.unwrap());
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    fn test_failing_mock_backend() {
        let backend = MockBackend::failing("quota exceeded");
        let request = ChatRequest::new(vec![ChatMessage::user("Test")]);

        let err = tokio_test::block_on(backend.chat(request)).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!tokio_test::block_on(backend.health_check()).unwrap());
    }

    #[test]
    fn test_bedrock_request_serialization() {
        let request = BedrockRequest {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens: 2000,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "Build a team".to_string(),
            }],
            temperature: Some(0.3),
            top_p: Some(0.9),
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json["top_p"].as_f64().unwrap() > 0.89);
    }

    #[test]
    fn test_bedrock_invoke_path() {
        let backend = BedrockBackend::new(
            AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
                region: "us-west-2".to_string(),
            },
            "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string(),
            30,
        );

        assert_eq!(backend.host(), "bedrock-runtime.us-west-2.amazonaws.com");
        assert_eq!(
            backend.invoke_path(),
            "/model/anthropic.claude-3-5-sonnet-20240620-v1%3A0/invoke"
        );
    }

    #[test]
    fn test_anthropic_response_deserialization() {
        let json = r#"{
            "content": [{"type": "text", "text": "**PLAYER: "}, {"type": "text", "text": "Boaster**"}],
            "model": "claude-3-5-sonnet-20240620",
            "usage": {"input_tokens": 100, "output_tokens": 50}
        }"#;

        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let chat = response.into_chat_response("fallback");
        assert_eq!(chat.content, "**PLAYER: Boaster**");
        assert_eq!(chat.model, "claude-3-5-sonnet-20240620");
        assert_eq!(chat.tokens_used.unwrap().total_tokens, 150);
    }

    #[test]
    fn test_anthropic_response_empty_content() {
        let response: AnthropicResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        let chat = response.into_chat_response("fallback");
        assert!(chat.content.is_empty());
        assert_eq!(chat.model, "fallback");
        assert!(chat.tokens_used.is_none());
    }
}
