use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{ApiError, Result};

/// Nearest-neighbor lookup over the book collection. Behind a trait so the
/// retriever can be driven by a canned fake in tests.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-k entries for a query vector, ascending by cosine distance.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>>;
}

/// One nearest-neighbor hit, in the index's own order.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub id: String,
    pub document: String,
    pub metadata: serde_json::Value,
    pub distance: f32,
}

/// One entry as stored in the collection: id is the book title, the document
/// is the embedded `short` text, metadata carries `{title, full}`.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: serde_json::Value,
}

/// Chroma server REST client for a single collection, resolved to its id at
/// connect time.
#[derive(Debug, Clone)]
pub struct ChromaIndex {
    client: Client,
    base_url: String,
    collection_name: String,
    collection_id: String,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    name: String,
    metadata: serde_json::Value,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddRequest {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadatas: Vec<serde_json::Value>,
    documents: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<serde_json::Value>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl ChromaIndex {
    /// Open the collection, creating it (cosine space) if it does not exist.
    pub async fn connect(base_url: &str, collection: &str) -> Result<Self> {
        Self::open(base_url, collection, false).await
    }

    /// Drop any existing collection with this name and start fresh. Only the
    /// offline rebuild path uses this.
    pub async fn recreate(base_url: &str, collection: &str) -> Result<Self> {
        Self::open(base_url, collection, true).await
    }

    async fn open(base_url: &str, collection: &str, drop_existing: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        let base_url = base_url.trim_end_matches('/').to_string();

        if drop_existing {
            let url = format!("{}/api/v1/collections/{}", base_url, collection);
            let response = client.delete(&url).send().await.map_err(|e| {
                ApiError::ExternalService(format!("Chroma delete request failed: {}", e))
            })?;
            if response.status().is_success() {
                info!("Dropped existing Chroma collection {:?}", collection);
            } else {
                debug!("No existing Chroma collection {:?} to drop", collection);
            }
        }

        let request = CreateCollectionRequest {
            name: collection.to_string(),
            // cosine distance to match the embeddings' similarity metric
            metadata: serde_json::json!({ "hnsw:space": "cosine" }),
            get_or_create: true,
        };

        let url = format!("{}/api/v1/collections", base_url);
        let response = client.post(&url).json(&request).send().await.map_err(|e| {
            ApiError::ExternalService(format!("Chroma collection request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Chroma collection setup failed: {}", error_text);
            return Err(ApiError::ExternalService(format!(
                "Chroma collection setup failed: {}",
                error_text
            )));
        }

        let collection_info: CollectionInfo = response.json().await.map_err(|e| {
            ApiError::Serialization(format!("Failed to parse Chroma collection response: {}", e))
        })?;

        debug!(
            "Connected to Chroma collection {:?} ({})",
            collection, collection_info.id
        );

        Ok(Self {
            client,
            base_url,
            collection_name: collection.to_string(),
            collection_id: collection_info.id,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Add a batch of entries to the collection.
    pub async fn add(&self, entries: &[IndexedEntry]) -> Result<()> {
        let request = AddRequest {
            ids: entries.iter().map(|e| e.id.clone()).collect(),
            embeddings: entries.iter().map(|e| e.embedding.clone()).collect(),
            metadatas: entries.iter().map(|e| e.metadata.clone()).collect(),
            documents: entries.iter().map(|e| e.document.clone()).collect(),
        };

        let url = format!(
            "{}/api/v1/collections/{}/add",
            self.base_url, self.collection_id
        );
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Chroma add request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Chroma add failed: {}", error_text);
            return Err(ApiError::ExternalService(format!(
                "Chroma add failed: {}",
                error_text
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let request = QueryRequest {
            query_embeddings: vec![vector.to_vec()],
            n_results: k,
            include: vec!["documents", "metadatas", "distances"],
        };

        debug!("Querying Chroma for {} nearest entries", k);
        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, self.collection_id
        );
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("Chroma query failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Chroma query error: {}", error_text);
            return Err(ApiError::ExternalService(format!(
                "Chroma query error: {}",
                error_text
            )));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            ApiError::Serialization(format!("Failed to parse Chroma query response: {}", e))
        })?;

        Ok(entries_from_response(parsed))
    }
}

/// Flatten Chroma's per-query nested arrays for the single query we send.
/// Missing rows are tolerated: absent documents/metadata become empty values
/// and an absent distance becomes the 1.0 no-match sentinel.
fn entries_from_response(response: QueryResponse) -> Vec<ScoredEntry> {
    let ids = match response.ids.into_iter().next() {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Vec::new(),
    };

    let documents = response
        .documents
        .and_then(|mut rows| (!rows.is_empty()).then(|| rows.remove(0)))
        .unwrap_or_default();
    let metadatas = response
        .metadatas
        .and_then(|mut rows| (!rows.is_empty()).then(|| rows.remove(0)))
        .unwrap_or_default();
    let distances = response
        .distances
        .and_then(|mut rows| (!rows.is_empty()).then(|| rows.remove(0)))
        .unwrap_or_default();

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| ScoredEntry {
            id,
            document: documents.get(i).cloned().flatten().unwrap_or_default(),
            metadata: metadatas
                .get(i)
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            distance: distances.get(i).copied().unwrap_or(1.0),
        })
        .collect()
}
