//! Test doubles for the embedding service, vector index and LLM
//!
//! Every fake appends to a shared [`CallLog`] so tests can assert which
//! external services a request reached and in what order.
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use async_trait::async_trait;
use axum::Router;
use ewa_core::{AppConfig, EwaError, IndexMatch, LlmClient, Result};
use ewa_rag::{SupportPipeline, DEFAULT_TOP_K};
use ewa_vector::{EmbeddingClient, VectorIndex};
use std::sync::{Arc, Mutex};

/// Ordered record of external calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Embedding client returning a constant vector
pub struct StaticEmbedding {
    log: CallLog,
}

#[async_trait]
impl EmbeddingClient for StaticEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.log.push(format!("embed:{text}"));
        Ok(vec![0.1; 8])
    }

    fn dimension(&self) -> usize {
        8
    }
}

/// Index returning fixed passages in order
pub struct StaticIndex {
    passages: Vec<String>,
    log: CallLog,
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        self.log
            .push(format!("query:top_k={top_k}:metadata={include_metadata}"));
        Ok(self
            .passages
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, text)| IndexMatch::new(format!("doc-{i}"), 0.9 - i as f32 * 0.1, text))
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Index that always fails
pub struct FailingIndex {
    log: CallLog,
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        self.log.push(format!("query:top_k={top_k}:failed"));
        Err(EwaError::VectorIndex("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Embedding client that always fails
pub struct FailingEmbedding {
    log: CallLog,
}

#[async_trait]
impl EmbeddingClient for FailingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.log.push(format!("embed:{text}:failed"));
        Err(EwaError::Embedding("model not loaded".to_string()))
    }

    fn dimension(&self) -> usize {
        8
    }
}

/// LLM that returns a canned answer and keeps every prompt
pub struct RecordingLlm {
    answer: String,
    prompts: CallLog,
    log: CallLog,
}

#[async_trait]
impl LlmClient for RecordingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.log.push("generate");
        self.prompts.push(prompt);
        Ok(self.answer.clone())
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// LLM that keeps the prompt and then fails
pub struct FailingLlm {
    prompts: CallLog,
    log: CallLog,
}

#[async_trait]
impl LlmClient for FailingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.log.push("generate:failed");
        self.prompts.push(prompt);
        Err(EwaError::Llm("Cohere API error 429: rate limited".to_string()))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Application state wired to fakes
pub struct TestHarness {
    pub state: Arc<AppState>,
    /// External calls in order
    pub log: CallLog,
    /// Prompts sent to the LLM
    pub prompts: CallLog,
}

impl TestHarness {
    /// Pipeline whose index returns `passages` and whose LLM replies `answer`
    pub fn new(answer: &str, passages: &[&str]) -> Self {
        Self::assemble(|log, prompts| {
            (
                static_embedding(log),
                static_index(passages, log),
                recording_llm(answer, log, prompts),
            )
        })
    }

    /// Pipeline whose embedding call always fails
    pub fn failing_embedding() -> Self {
        Self::assemble(|log, prompts| {
            (
                Arc::new(FailingEmbedding { log: log.clone() }) as Arc<dyn EmbeddingClient>,
                static_index(&["unused"], log),
                recording_llm("unused", log, prompts),
            )
        })
    }

    /// Pipeline whose index query always fails
    pub fn failing_index() -> Self {
        Self::assemble(|log, prompts| {
            (
                static_embedding(log),
                Arc::new(FailingIndex { log: log.clone() }) as Arc<dyn VectorIndex>,
                recording_llm("unused", log, prompts),
            )
        })
    }

    /// Pipeline whose LLM call always fails
    pub fn failing_llm(passages: &[&str]) -> Self {
        Self::assemble(|log, prompts| {
            (
                static_embedding(log),
                static_index(passages, log),
                Arc::new(FailingLlm {
                    prompts: prompts.clone(),
                    log: log.clone(),
                }) as Arc<dyn LlmClient>,
            )
        })
    }

    fn assemble<F>(build: F) -> Self
    where
        F: FnOnce(
            &CallLog,
            &CallLog,
        ) -> (
            Arc<dyn EmbeddingClient>,
            Arc<dyn VectorIndex>,
            Arc<dyn LlmClient>,
        ),
    {
        let log = CallLog::default();
        let prompts = CallLog::default();
        let (embedder, index, llm) = build(&log, &prompts);
        let pipeline = SupportPipeline::new(embedder, index, llm, DEFAULT_TOP_K);

        Self {
            state: Arc::new(AppState::new(AppConfig::default(), pipeline)),
            log,
            prompts,
        }
    }

    pub fn router(&self) -> Router {
        crate::create_router(self.state.clone())
    }
}

fn static_index(passages: &[&str], log: &CallLog) -> Arc<dyn VectorIndex> {
    Arc::new(StaticIndex {
        passages: passages.iter().map(|p| p.to_string()).collect(),
        log: log.clone(),
    })
}

fn static_embedding(log: &CallLog) -> Arc<dyn EmbeddingClient> {
    Arc::new(StaticEmbedding { log: log.clone() })
}

fn recording_llm(answer: &str, log: &CallLog, prompts: &CallLog) -> Arc<dyn LlmClient> {
    Arc::new(RecordingLlm {
        answer: answer.to_string(),
        prompts: prompts.clone(),
        log: log.clone(),
    })
}
