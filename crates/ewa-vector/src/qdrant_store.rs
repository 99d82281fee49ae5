//! Qdrant implementation of the vector index
//!
//! Passages are stored with their text under the `text` payload key,
//! matching the metadata layout used for Pinecone.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use ewa_core::{EwaError, IndexConfig, IndexMatch, Result};
use qdrant_client::qdrant::{point_id::PointIdOptions, PointId, SearchPointsBuilder};
use qdrant_client::Qdrant;

/// Qdrant vector index client
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    /// Create a new Qdrant connection
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| EwaError::VectorIndex(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.qdrant_collection.clone(),
        })
    }
}

fn point_id_string(id: Option<PointId>) -> String {
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u,
        None => String::new(),
    }
}

#[async_trait]
impl super::VectorIndex for QdrantIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
                    .with_payload(include_metadata),
            )
            .await
            .map_err(|e| EwaError::VectorIndex(format!("Vector search failed: {e}")))?;

        results
            .result
            .into_iter()
            .map(|point| {
                let id = point_id_string(point.id);
                let text = if include_metadata {
                    point
                        .payload
                        .get("text")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .ok_or_else(|| {
                            EwaError::VectorIndex(format!("Match {id} has no metadata text"))
                        })?
                } else {
                    String::new()
                };
                Ok(IndexMatch::new(id, point.score, text))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
