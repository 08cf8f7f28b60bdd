use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::Candidate;
use crate::services::chroma::VectorIndex;
use crate::services::embedding::Embedder;

/// Distance reported when the index returns nothing. Thresholds in this
/// cosine space are below 1, so the sentinel fails every "close enough"
/// check downstream.
pub const NO_MATCH_DISTANCE: f32 = 1.0;

/// Embeds the query and runs nearest-neighbor search, projecting index hits
/// into catalog-shaped candidates. One embedding call and one index query
/// per invocation; failures of either propagate instead of being masked as
/// an empty result.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Top-k candidates in the index's ascending-distance order (never
    /// re-sorted here) plus the best-match distance.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<(Vec<Candidate>, f32)> {
        let vector = self.embedder.embed(query).await?;
        let entries = self.index.query(&vector, k).await?;

        if entries.is_empty() {
            return Ok((Vec::new(), NO_MATCH_DISTANCE));
        }

        let candidates: Vec<Candidate> = entries
            .into_iter()
            .map(|entry| Candidate {
                title: entry.id,
                short: entry.document,
                full: entry
                    .metadata
                    .get("full")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                distance: entry.distance,
            })
            .collect();

        let best_distance = candidates[0].distance;
        debug!(
            "Retrieved {} candidates, best distance {:.3}",
            candidates.len(),
            best_distance
        );

        Ok((candidates, best_distance))
    }
}
