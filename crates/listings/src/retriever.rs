//! Semantic retrieval over the listing index.
//!
//! A thin wrapper: embed the raw query text, run nearest-neighbor search,
//! return the candidates. This is the deliberately loose stage — no
//! filtering happens here.

use crate::embeddings::EmbeddingProvider;
use crate::types::ScoredListing;
use crate::vector_index::ListingIndex;
use propchat_core::AppResult;
use std::sync::Arc;

/// Trait for candidate retrieval.
///
/// The orchestrator depends on this trait rather than on the index and
/// embedder directly, so tests can inject fakes.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` candidates for the query, ordered by descending
    /// similarity score.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<ScoredListing>>;
}

/// Retriever backed by an embedding provider and a vector index.
pub struct SemanticRetriever {
    index: Arc<dyn ListingIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SemanticRetriever {
    /// Create a retriever from shared index and embedder handles.
    pub fn new(index: Arc<dyn ListingIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait::async_trait]
impl Retriever for SemanticRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<ScoredListing>> {
        let embedding = self.embedder.embed(query).await?;

        let candidates = self.index.search(&embedding, k)?;

        tracing::debug!(
            "Semantic search returned {} candidates for top-{}",
            candidates.len(),
            k
        );

        Ok(candidates)
    }
}
