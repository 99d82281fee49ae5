//! Ewa Vector - Embedding and vector index abstraction
//!
//! Turns a question into a dense vector and looks up the nearest
//! knowledge-base passages in a hosted index (Pinecone or Qdrant).

use async_trait::async_trait;
use ewa_core::{IndexConfig, IndexMatch, Result, VectorProvider};

pub mod embedding;
pub mod pinecone_store;
pub mod qdrant_store;

pub use embedding::{create_embedding_client, EmbeddingClient};
pub use pinecone_store::PineconeIndex;
pub use qdrant_store::QdrantIndex;

/// Trait for vector index lookups
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest passages, best match first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Create a vector index client from config
pub async fn create_vector_index(config: &IndexConfig) -> Result<Box<dyn VectorIndex>> {
    match config.provider {
        VectorProvider::Pinecone => Ok(Box::new(PineconeIndex::connect(config).await?)),
        VectorProvider::Qdrant => Ok(Box::new(QdrantIndex::new(config)?)),
    }
}
