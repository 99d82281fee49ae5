//! Ewa RAG - Retrieval-Augmented Generation pipeline
//!
//! Answers a support question in three fixed steps:
//! 1. Embed the question
//! 2. Retrieve the top-K passages from the vector index
//! 3. Generate an answer grounded in those passages
//!
//! There is no re-ranking, filtering or retry between steps; the first
//! failure ends the request.
//!
//! Author: hephaex@gmail.com

use ewa_core::{AppConfig, LlmClient, Result, RetrievedContext};
use ewa_vector::{create_embedding_client, create_vector_index, EmbeddingClient, VectorIndex};
use std::sync::Arc;
use std::time::Instant;

pub mod llm;
pub mod prompt;

pub use llm::{create_llm_client, CohereClient, OllamaClient, OpenAiClient};
pub use prompt::{build_prompt, PromptBuilder, SUPPORT_PERSONA};

/// Number of passages retrieved per question
pub const DEFAULT_TOP_K: usize = 5;

// ============================================================================
// Context Retriever
// ============================================================================

/// Embeds a question and looks up its nearest passages
pub struct ContextRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// Retrieve passages for the question, best match first
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedContext> {
        let vector = self.embedder.embed(question).await?;
        tracing::debug!(dimension = vector.len(), "Question embedded");

        let matches = self.index.query(&vector, self.top_k, true).await?;
        tracing::debug!(
            backend = self.index.name(),
            matches = matches.len(),
            "Vector index queried"
        );

        Ok(RetrievedContext::from(matches))
    }
}

// ============================================================================
// Answer Generator
// ============================================================================

/// Turns a question and its context into an answer
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Generate an answer, trimmed of surrounding whitespace
    pub async fn generate(&self, question: &str, context: &RetrievedContext) -> Result<String> {
        let prompt = build_prompt(question, context);
        tracing::info!(
            model = self.llm.model(),
            prompt_chars = prompt.len(),
            "Calling LLM"
        );

        let answer = self.llm.generate(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

// ============================================================================
// Support Pipeline
// ============================================================================

/// The full embed, retrieve, generate pipeline
///
/// Built once per process and shared read-only across requests.
pub struct SupportPipeline {
    retriever: ContextRetriever,
    generator: AnswerGenerator,
}

impl SupportPipeline {
    /// Create a pipeline from already built clients
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: ContextRetriever::new(embedder, index, top_k),
            generator: AnswerGenerator::new(llm),
        }
    }

    /// Build every client from config
    ///
    /// Fails if a credential the selected providers need is missing.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let embedder: Arc<dyn EmbeddingClient> =
            Arc::from(create_embedding_client(&config.embedding)?);
        tracing::info!(
            model = %config.embedding.model,
            dimension = embedder.dimension(),
            "Embedding client ready"
        );

        let index: Arc<dyn VectorIndex> = Arc::from(create_vector_index(&config.index).await?);
        tracing::info!(backend = index.name(), "Vector index client ready");

        let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);
        tracing::info!(model = llm.model(), "LLM client ready");

        Ok(Self::new(embedder, index, llm, config.index.top_k))
    }

    /// Answer a validated question
    pub async fn answer(&self, question: &str) -> Result<String> {
        let start = Instant::now();
        tracing::info!("Processing question: {}", question);

        let context = self.retriever.retrieve(question).await?;
        let answer = self.generator.generate(question, &context).await?;

        tracing::info!(
            passages = context.len(),
            answer_chars = answer.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated response successfully"
        );
        Ok(answer)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ewa_core::{EwaError, IndexMatch};
    use std::sync::Mutex;

    struct FixedEmbedding;

    #[async_trait]
    impl EmbeddingClient for FixedEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.25; 4])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct FixedIndex {
        passages: Vec<&'static str>,
        requested_top_k: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(
            &self,
            _vector: &[f32],
            top_k: usize,
            _include_metadata: bool,
        ) -> Result<Vec<IndexMatch>> {
            *self.requested_top_k.lock().unwrap() = Some(top_k);
            Ok(self
                .passages
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, p)| IndexMatch::new(i.to_string(), 1.0 - i as f32 * 0.1, *p))
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct EchoLlm {
        prompts: Mutex<Vec<String>>,
        reply: Result<String>,
    }

    impl EchoLlm {
        fn replying(reply: &str) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                reply: Ok(reply.to_string()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(EwaError::Llm(e.to_string())),
            }
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_pipeline_trims_answer_and_uses_context() {
        let index = Arc::new(FixedIndex {
            passages: vec!["Booking opens at 8am.", "Cancel in the app."],
            requested_top_k: Mutex::new(None),
        });
        let llm = Arc::new(EchoLlm::replying("\n  Open the app and pick a barber.  \n"));
        let pipeline = SupportPipeline::new(
            Arc::new(FixedEmbedding),
            index.clone(),
            llm.clone(),
            DEFAULT_TOP_K,
        );

        let answer = pipeline.answer("How do I book?").await.unwrap();

        assert_eq!(answer, "Open the app and pick a barber.");
        assert_eq!(*index.requested_top_k.lock().unwrap(), Some(5));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\nBooking opens at 8am.\nCancel in the app.\n"));
        assert!(prompts[0].contains("Question: How do I book?\nAnswer:"));
    }

    #[tokio::test]
    async fn test_retriever_caps_at_top_k() {
        let index = Arc::new(FixedIndex {
            passages: vec!["a", "b", "c", "d", "e", "f", "g"],
            requested_top_k: Mutex::new(None),
        });
        let retriever = ContextRetriever::new(Arc::new(FixedEmbedding), index, DEFAULT_TOP_K);

        let context = retriever.retrieve("anything").await.unwrap();

        assert_eq!(context.passages(), ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let llm = Arc::new(EchoLlm {
            prompts: Mutex::new(Vec::new()),
            reply: Err(EwaError::Llm("service unavailable".to_string())),
        });
        let generator = AnswerGenerator::new(llm);

        let err = generator
            .generate("q", &RetrievedContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EwaError::Llm(ref msg) if msg.contains("service unavailable")));
    }

    #[tokio::test]
    async fn test_from_config_rejects_missing_credentials() {
        let err = SupportPipeline::from_config(&AppConfig::default())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, EwaError::Config(ref msg) if msg.contains("PINECONE_API_KEY")));
    }
}
