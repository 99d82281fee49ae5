//! Pinecone implementation of the vector index
//!
//! The index host is resolved once from the index name through the
//! control plane; queries then go straight to the data plane.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use ewa_core::{EwaError, IndexConfig, IndexMatch, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const API_VERSION: &str = "2024-07";

/// Pinecone index client
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    host: String,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

impl PineconeIndex {
    /// Connect to an index by name, resolving its data plane host
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = config
            .pinecone_api_key
            .as_ref()
            .ok_or_else(|| EwaError::Config("Pinecone API key required".to_string()))?;
        let index_name = config
            .pinecone_index
            .as_ref()
            .ok_or_else(|| EwaError::Config("Pinecone index name required".to_string()))?;

        let client = Client::new();
        let controller = config.pinecone_controller_url.trim_end_matches('/');

        let response = client
            .get(format!("{controller}/indexes/{index_name}"))
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| EwaError::VectorIndex(format!("Failed to describe index: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::VectorIndex(format!(
                "Failed to describe index {index_name}: {error_text}"
            )));
        }

        let description: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| EwaError::VectorIndex(format!("Failed to parse index description: {e}")))?;

        tracing::info!(index = %index_name, host = %description.host, "Pinecone index resolved");

        Ok(Self {
            client,
            api_key: api_key.clone(),
            host: normalize_host(&description.host),
        })
    }

    /// Create a client for an already known data plane host
    pub fn with_host(api_key: impl Into<String>, host: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            host: normalize_host(host.as_ref()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// The control plane reports hosts without a scheme
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[async_trait]
impl super::VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| EwaError::VectorIndex(format!("Query request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EwaError::VectorIndex(format!("Pinecone error: {error_text}")));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| EwaError::VectorIndex(format!("Failed to parse query response: {e}")))?;

        result
            .matches
            .into_iter()
            .map(|m| {
                let text = if include_metadata {
                    m.metadata
                        .as_ref()
                        .and_then(|meta| meta.get("text"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .ok_or_else(|| {
                            EwaError::VectorIndex(format!("Match {} has no metadata text", m.id))
                        })?
                } else {
                    String::new()
                };
                Ok(IndexMatch::new(m.id, m.score, text))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VectorIndex;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("ewa-abc123.svc.us-east-1.pinecone.io"),
            "https://ewa-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[tokio::test]
    async fn test_query_preserves_index_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("api-key", "pc-key"))
            .and(body_json(json!({
                "vector": [0.1, 0.2],
                "topK": 5,
                "includeMetadata": true,
                "includeValues": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    { "id": "faq-2", "score": 0.93, "metadata": { "text": "Payments are taken after the cut." } },
                    { "id": "faq-7", "score": 0.41, "metadata": { "text": "Barbers travel to you." } }
                ],
                "namespace": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let index = PineconeIndex::with_host("pc-key", server.uri());
        let matches = index.query(&[0.1, 0.2], 5, true).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "faq-2");
        assert_eq!(matches[0].text, "Payments are taken after the cut.");
        assert_eq!(matches[1].text, "Barbers travel to you.");
    }

    #[tokio::test]
    async fn test_match_without_text_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [{ "id": "orphan", "score": 0.5, "metadata": { "source": "faq.md" } }]
            })))
            .mount(&server)
            .await;

        let index = PineconeIndex::with_host("pc-key", server.uri());
        let err = index.query(&[0.1], 5, true).await.unwrap_err();

        assert!(matches!(err, EwaError::VectorIndex(ref msg) if msg.contains("orphan")));
    }

    #[tokio::test]
    async fn test_error_status_is_index_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let index = PineconeIndex::with_host("bad-key", server.uri());
        let err = index.query(&[0.1], 5, true).await.unwrap_err();

        assert_eq!(err.to_string(), "Vector index error: Pinecone error: invalid api key");
    }

    #[tokio::test]
    async fn test_connect_resolves_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/ewa-support"))
            .and(header("api-key", "pc-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "ewa-support",
                "dimension": 768,
                "host": "ewa-support-abc.svc.aped-4627-b74a.pinecone.io"
            })))
            .mount(&server)
            .await;

        let config = IndexConfig {
            pinecone_api_key: Some("pc-key".to_string()),
            pinecone_index: Some("ewa-support".to_string()),
            pinecone_controller_url: server.uri(),
            ..Default::default()
        };

        let index = PineconeIndex::connect(&config).await.unwrap();
        assert_eq!(
            index.host(),
            "https://ewa-support-abc.svc.aped-4627-b74a.pinecone.io"
        );
    }

    #[tokio::test]
    async fn test_connect_without_key_fails() {
        let config = IndexConfig::default();
        assert!(matches!(
            PineconeIndex::connect(&config).await,
            Err(EwaError::Config(_))
        ));
    }
}
