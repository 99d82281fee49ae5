//! Configuration Management
//!
//! Handles configuration from environment variables and TOML files.
//! The three service credentials (index API key, index name, generation
//! API key) must be present before any client is built.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector index configuration
    pub index: IndexConfig,

    /// Embedding model configuration
    pub embedding: EmbeddingConfig,

    /// Generation service configuration
    pub llm: LlmConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration the way the binaries do
    ///
    /// If `EWA_CONFIG` names a TOML file it is read first and environment
    /// variables are layered on top; otherwise only the environment is used.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("EWA_CONFIG") {
            Ok(path) => Self::from_file(path)?.with_env_override(),
            Err(_) => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(&lookup)?;
        Ok(config)
    }

    fn apply_lookup<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }

        // Vector index
        if let Some(provider) = lookup("VECTOR_PROVIDER") {
            self.index.provider = provider.parse()?;
        }
        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.index.pinecone_api_key = Some(key);
        }
        if let Some(name) = lookup("PINECONE_INDEX") {
            self.index.pinecone_index = Some(name);
        }
        if let Some(url) = lookup("PINECONE_CONTROLLER_URL") {
            self.index.pinecone_controller_url = url;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.index.qdrant_url = url;
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.index.qdrant_collection = collection;
        }

        // Embedding
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
            if lookup("EMBEDDING_MODEL").is_none() {
                self.embedding.model = self.embedding.provider.default_model().to_string();
            }
        }
        if let Some(url) = lookup("EMBEDDING_URL") {
            self.embedding.url = url;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        // LLM
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
            if lookup("LLM_MODEL").is_none() {
                self.llm.model = self.llm.provider.default_model().to_string();
            }
        }
        if let Some(key) = lookup("COHERE_API_KEY") {
            self.llm.cohere_api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key.clone());
            self.embedding.openai_api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.openai_base_url = Some(url);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.llm.ollama_url = url.clone();
            if self.embedding.provider == EmbeddingProvider::Ollama
                && lookup("EMBEDDING_URL").is_none()
            {
                self.embedding.url = url;
            }
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(max_tokens) = lookup("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_value("LLM_MAX_TOKENS", max_tokens)?;
        }
        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            self.llm.temperature = parse_value("LLM_TEMPERATURE", temperature)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_lookup(&|key: &str| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Check that every credential the selected providers need is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.index.provider {
            VectorProvider::Pinecone => {
                require(&self.index.pinecone_api_key, "PINECONE_API_KEY")?;
                require(&self.index.pinecone_index, "PINECONE_INDEX")?;
            }
            VectorProvider::Qdrant => {}
        }

        if self.embedding.provider == EmbeddingProvider::OpenAI {
            require(&self.embedding.openai_api_key, "OPENAI_API_KEY")?;
        }

        match self.llm.provider {
            LlmProvider::Cohere => require(&self.llm.cohere_api_key, "COHERE_API_KEY")?,
            LlmProvider::OpenAI => require(&self.llm.openai_api_key, "OPENAI_API_KEY")?,
            LlmProvider::Ollama => {}
        }

        // A provider switched in a config file keeps the previous default model
        let foreign_embedding_model = EmbeddingProvider::ALL.iter().any(|p| {
            *p != self.embedding.provider && p.default_model() == self.embedding.model
        });
        if foreign_embedding_model {
            return Err(ConfigError::InvalidValue {
                key: "EMBEDDING_MODEL".to_string(),
                value: self.embedding.model.clone(),
            });
        }

        let foreign_llm_model = LlmProvider::ALL
            .iter()
            .any(|p| *p != self.llm.provider && p.default_model() == self.llm.model);
        if foreign_llm_model {
            return Err(ConfigError::InvalidValue {
                key: "LLM_MODEL".to_string(),
                value: self.llm.model.clone(),
            });
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn require(value: &Option<String>, key: &str) -> Result<(), ConfigError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingRequired(key.to_string())),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index backend to query
    pub provider: VectorProvider,

    /// Pinecone API key
    pub pinecone_api_key: Option<String>,

    /// Pinecone index name
    pub pinecone_index: Option<String>,

    /// Pinecone control plane URL, used to resolve the index host
    pub pinecone_controller_url: String,

    /// Qdrant gRPC URL
    pub qdrant_url: String,

    /// Qdrant collection name
    pub qdrant_collection: String,

    /// Number of passages to retrieve
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: VectorProvider::Pinecone,
            pinecone_api_key: None,
            pinecone_index: None,
            pinecone_controller_url: "https://api.pinecone.io".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_collection: "ewa_knowledge".to_string(),
            top_k: 5,
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider to use
    pub provider: EmbeddingProvider,

    /// Base URL of the embedding server (TEI or Ollama)
    pub url: String,

    /// Embedding model name
    pub model: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Tei,
            url: "http://localhost:8081".to_string(),
            model: EmbeddingProvider::Tei.default_model().to_string(),
            openai_api_key: None,
        }
    }
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// Cohere API key
    pub cohere_api_key: Option<String>,

    /// Cohere API base URL
    pub cohere_base_url: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for Azure or compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Cohere,
            cohere_api_key: None,
            cohere_base_url: "https://api.cohere.com".to_string(),
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: LlmProvider::Cohere.default_model().to_string(),
            max_tokens: 300,
            temperature: 0.3,
        }
    }
}

/// Supported vector index backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorProvider {
    Pinecone,
    Qdrant,
}

impl std::str::FromStr for VectorProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(Self::Pinecone),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(ConfigError::InvalidValue {
                key: "VECTOR_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face text-embeddings-inference server
    Tei,
    OpenAI,
    Ollama,
}

impl EmbeddingProvider {
    pub const ALL: [Self; 3] = [Self::Tei, Self::OpenAI, Self::Ollama];

    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Tei => "intfloat/e5-base-v2",
            Self::OpenAI => "text-embedding-3-small",
            Self::Ollama => "nomic-embed-text",
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tei" => Ok(Self::Tei),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Cohere,
    OpenAI,
    Ollama,
}

impl LlmProvider {
    pub const ALL: [Self; 3] = [Self::Cohere, Self::OpenAI, Self::Ollama];

    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Cohere => "command-r-plus-08-2024",
            Self::OpenAI => "gpt-4o-mini",
            Self::Ollama => "llama3.1",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cohere" => Ok(Self::Cohere),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
