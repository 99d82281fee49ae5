//! Embedding client for generating vector representations
//!
//! Supports a Hugging Face text-embeddings-inference server (the default,
//! hosting `intfloat/e5-base-v2`), OpenAI, and Ollama.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use ewa_core::{EmbeddingConfig, EmbeddingProvider, EwaError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;
}

// ============================================================================
// Text Embeddings Inference Client
// ============================================================================

/// Client for a text-embeddings-inference server
pub struct TeiEmbedding {
    client: Client,
    base_url: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct TeiRequest<'a> {
    inputs: Vec<&'a str>,
}

impl TeiEmbedding {
    /// Create a new TEI client for the given model
    pub fn new(base_url: impl Into<String>, model: &str) -> Self {
        let dimension = match model {
            "intfloat/e5-base-v2" => 768,
            "intfloat/e5-large-v2" => 1024,
            "intfloat/e5-small-v2" => 384,
            "sentence-transformers/all-MiniLM-L6-v2" => 384,
            _ => 768,
        };

        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(config.url.clone(), &config.model)
    }
}

#[async_trait]
impl EmbeddingClient for TeiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = TeiRequest { inputs: vec![text] };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Embedding(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Embedding(format!(
                "Embedding server error: {error_text}"
            )));
        }

        let result: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| EwaError::Embedding(format!("Failed to parse embedding response: {e}")))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| EwaError::Embedding("No embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        };

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| EwaError::Config("OpenAI API key required".to_string()))?;

        Ok(Self::new(api_key.clone(), config.model.clone()))
    }

    /// Set custom base URL (for Azure or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbeddingRequest {
            input: vec![text],
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Embedding(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Embedding(format!(
                "OpenAI embedding error: {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EwaError::Embedding(format!("Failed to parse embedding response: {e}")))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EwaError::Embedding("No embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768,
        };

        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(config.url.clone(), config.model.clone())
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::Embedding(format!("Ollama embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::Embedding(format!(
                "Ollama embedding error: {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EwaError::Embedding(format!("Failed to parse embedding response: {e}")))?;

        Ok(result.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingClient>> {
    match config.provider {
        EmbeddingProvider::Tei => Ok(Box::new(TeiEmbedding::from_config(config))),
        EmbeddingProvider::OpenAI => Ok(Box::new(OpenAiEmbedding::from_config(config)?)),
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(config))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tei_dimension() {
        let client = TeiEmbedding::new("http://localhost:8081", "intfloat/e5-base-v2");
        assert_eq!(client.dimension(), 768);

        let client = TeiEmbedding::new("http://localhost:8081", "intfloat/e5-large-v2");
        assert_eq!(client.dimension(), 1024);
    }

    #[test]
    fn test_openai_requires_key() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::OpenAI,
            ..Default::default()
        };
        assert!(create_embedding_client(&config).is_err());
    }

    #[tokio::test]
    async fn test_tei_embed_returns_first_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(body_json(serde_json::json!({ "inputs": ["How do I book a barber?"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![vec![0.1f32, 0.2, 0.3]]))
            .expect(1)
            .mount(&server)
            .await;

        let client = TeiEmbedding::new(format!("{}/", server.uri()), "intfloat/e5-base-v2");
        let vector = client.embed("How do I book a barber?").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_tei_server_error_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let client = TeiEmbedding::new(server.uri(), "intfloat/e5-base-v2");
        let err = client.embed("hello").await.unwrap_err();

        assert!(matches!(err, EwaError::Embedding(ref msg) if msg.contains("model loading")));
    }

    #[tokio::test]
    async fn test_openai_embed_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.5, 0.25], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedding::new("sk-test", "text-embedding-3-small").with_base_url(server.uri());
        let vector = client.embed("cancel booking").await.unwrap();

        assert_eq!(vector, vec![0.5, 0.25]);
        assert_eq!(client.dimension(), 1536);
    }

    #[tokio::test]
    async fn test_ollama_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "embedding": [1.0, 0.0] })),
            )
            .mount(&server)
            .await;

        let client = OllamaEmbedding::new(server.uri(), "nomic-embed-text");
        assert_eq!(client.embed("refund").await.unwrap(), vec![1.0, 0.0]);
    }
}
