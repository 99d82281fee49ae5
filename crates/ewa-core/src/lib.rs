//! Ewa Core - Shared types, traits, and configuration
//!
//! This crate defines the abstractions used across the support assistant:
//! - Common error type
//! - Vector index match and retrieved context types
//! - Generation client trait
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, IndexConfig, LlmConfig,
    LlmProvider, LoggingConfig, ServerConfig, VectorProvider,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for pipeline operations
#[derive(Error, Debug)]
pub enum EwaError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for EwaError {
    fn from(err: ConfigError) -> Self {
        EwaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EwaError>;

// ============================================================================
// Retrieval Models
// ============================================================================

/// A single hit returned by the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    /// Identifier of the stored passage
    pub id: String,

    /// Similarity score reported by the index
    pub score: f32,

    /// Passage text taken from the match metadata
    pub text: String,
}

impl IndexMatch {
    pub fn new(id: impl Into<String>, score: f32, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            text: text.into(),
        }
    }
}

/// Passages retrieved for a question, best match first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext(Vec<String>);

impl RetrievedContext {
    pub fn new(passages: Vec<String>) -> Self {
        Self(passages)
    }

    pub fn passages(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Passages joined with newlines, in relevance order
    pub fn joined(&self) -> String {
        self.0.join("\n")
    }
}

impl From<Vec<IndexMatch>> for RetrievedContext {
    fn from(matches: Vec<IndexMatch>) -> Self {
        Self(matches.into_iter().map(|m| m.text).collect())
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for text generation clients
///
/// Model, output cap and temperature are bound when the client is built,
/// so a call only carries the prompt.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a single completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier used for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
