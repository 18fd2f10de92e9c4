//! Vector index abstraction for property listings.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval.

use crate::types::{Listing, ScoredListing};
use propchat_core::AppResult;

/// Trait for listing index backends.
///
/// The query pipeline only ever reads (`search`, `count`); `add_listings`
/// exists for the external ingestion loader and for tests. Implementations
/// must allow concurrent readers — the index is process-wide read-only
/// state after startup.
pub trait ListingIndex: Send + Sync {
    /// Insert a batch of listings with embeddings into the index.
    fn add_listings(&mut self, listings: &[Listing]) -> AppResult<()>;

    /// Search for the top-k most similar listings to the query embedding.
    ///
    /// Returns listings ordered by descending similarity score.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredListing>>;

    /// Number of listings in the index.
    fn count(&self) -> AppResult<usize>;
}
