//! LLM Client implementations
//!
//! Provides single-shot completion against Cohere (the default),
//! OpenAI-compatible, and Ollama APIs.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use ewa_core::{EwaError, LlmClient, LlmConfig, LlmProvider, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ============================================================================
// Cohere Client
// ============================================================================

/// Cohere chat API client
pub struct CohereClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CohereChatResponse {
    text: String,
}

impl CohereClient {
    /// Create a new Cohere client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.cohere.com".to_string(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .cohere_api_key
            .as_ref()
            .ok_or_else(|| EwaError::Config("Cohere API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        )
        .with_base_url(config.cohere_base_url.clone()))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for CohereClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CohereChatRequest {
            model: &self.model,
            message: prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Llm(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Llm(format!("Cohere error: {error_text}")));
        }

        let result: CohereChatResponse = response
            .json()
            .await
            .map_err(|e| EwaError::Llm(format!("Failed to parse response: {e}")))?;

        Ok(result.text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI API client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| EwaError::Config("OpenAI API key required".to_string()))?;

        let base_url = config
            .openai_base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self::new(
            api_key.clone(),
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        )
        .with_base_url(base_url))
    }

    /// Set custom base URL (for Azure or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Llm(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Llm(format!("OpenAI error: {error_text}")));
        }

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| EwaError::Llm(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EwaError::Llm("No response generated".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Client
// ============================================================================

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.ollama_url.clone(),
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        )
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Llm(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Llm(format!("Ollama error: {error_text}")));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| EwaError::Llm(format!("Failed to parse Ollama response: {e}")))?;

        Ok(result.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Cohere => Ok(Box::new(CohereClient::from_config(config)?)),
        LlmProvider::OpenAI => Ok(Box::new(OpenAiClient::from_config(config)?)),
        LlmProvider::Ollama => Ok(Box::new(OllamaClient::from_config(config))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cohere_from_config_uses_defaults() {
        let config = LlmConfig {
            cohere_api_key: Some("co-key".to_string()),
            ..Default::default()
        };
        let client = CohereClient::from_config(&config).unwrap();

        assert_eq!(client.model(), "command-r-plus-08-2024");
        assert_eq!(client.max_tokens, 300);
        assert!((client.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_factory_requires_cohere_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            create_llm_client(&config),
            Err(EwaError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_cohere_generate_sends_fixed_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("authorization", "Bearer co-key"))
            .and(body_json(json!({
                "model": "command-r-plus-08-2024",
                "message": "Question: hi\nAnswer:",
                "max_tokens": 300,
                "temperature": 0.3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response_id": "r-1",
                "text": "  Hello from Ewa!  ",
                "finish_reason": "COMPLETE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            CohereClient::new("co-key", "command-r-plus-08-2024", 300, 0.3).with_base_url(server.uri());
        let text = client.generate("Question: hi\nAnswer:").await.unwrap();

        assert_eq!(text, "  Hello from Ewa!  ");
    }

    #[tokio::test]
    async fn test_cohere_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = CohereClient::new("co-key", "command-r-plus-08-2024", 300, 0.3)
            .with_base_url(server.uri());
        let err = client.generate("prompt").await.unwrap_err();

        assert_eq!(err.to_string(), "LLM error: Cohere error: rate limited");
    }

    #[tokio::test]
    async fn test_openai_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Sure." }, "finish_reason": "stop" }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", "gpt-4o-mini", 300, 0.3).with_base_url(server.uri());
        assert_eq!(client.generate("prompt").await.unwrap(), "Sure.");
    }

    #[tokio::test]
    async fn test_ollama_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "Book in the app.", "done": true })),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3", 300, 0.3);
        assert_eq!(client.generate("prompt").await.unwrap(), "Book in the app.");
    }
}
