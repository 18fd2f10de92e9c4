//! Query pipeline orchestration.
//!
//! Composes intent parsing, semantic retrieval, deterministic filtering,
//! context building and grounded summarization, with a fallback policy
//! when filtering yields nothing and link post-processing on the cards.

use crate::context::build_context;
use crate::intent::parse_query;
use crate::retriever::Retriever;
use crate::summarize::Summarizer;
use crate::types::{ResponsePayload, ResultCard, ScoredListing};
use propchat_core::AppResult;
use std::sync::Arc;

/// Default number of candidates fetched by semantic search.
pub const DEFAULT_TOP_K: usize = 12;

/// Number of raw candidates used when the deterministic filter matches
/// nothing.
const FALLBACK_LIMIT: usize = 6;

/// The full query-answering pipeline.
///
/// All components are injected and shared read-only; one instance serves
/// concurrent queries without locking. Queries execute as one sequential
/// async flow — the vector index and the generation endpoint are the only
/// awaited external calls.
pub struct QueryPipeline {
    retriever: Arc<dyn Retriever>,
    summarizer: Summarizer,
}

impl QueryPipeline {
    /// Create a pipeline from an injected retriever and summarizer.
    pub fn new(retriever: Arc<dyn Retriever>, summarizer: Summarizer) -> Self {
        Self {
            retriever,
            summarizer,
        }
    }

    /// Answer a query with the default retrieval width.
    pub async fn handle(&self, query: &str) -> AppResult<ResponsePayload> {
        self.handle_top_k(query, DEFAULT_TOP_K).await
    }

    /// Answer a query, retrieving up to `k` candidates.
    ///
    /// Fallback policy: when the deterministic filter rejects every
    /// candidate, the first [`FALLBACK_LIMIT`] raw candidates are used
    /// instead; when retrieval itself returned nothing, the fixed
    /// no-alternatives payload is returned without invoking generation.
    pub async fn handle_top_k(&self, query: &str, k: usize) -> AppResult<ResponsePayload> {
        let intent = parse_query(query);

        let candidates = self.retriever.retrieve(query, k).await?;
        tracing::info!(
            "Retrieved {} candidates for query '{}'",
            candidates.len(),
            query
        );

        let filtered = intent.apply(candidates.clone());

        let records: Vec<ScoredListing> = if filtered.is_empty() {
            candidates.into_iter().take(FALLBACK_LIMIT).collect()
        } else {
            filtered
        };

        if records.is_empty() {
            tracing::info!("No candidates at all for query '{}'", query);
            return Ok(ResponsePayload::no_alternatives());
        }

        let records_text = build_context(&records);

        let mut payload = self.summarizer.summarize(query, &records_text).await?;

        patch_card_links(&mut payload.cards, &records);

        Ok(payload)
    }
}

/// Fill in blank call-to-action URLs from the source records' slugs.
///
/// Cards are paired to records strictly by position: card i with record i.
/// This assumes the model preserved the input ordering when it emitted the
/// cards; if it reordered or dropped items, links can be mis-attributed.
/// A sturdier contract would have generation echo a record identifier per
/// card.
fn patch_card_links(cards: &mut [ResultCard], records: &[ScoredListing]) {
    for (card, (listing, _score)) in cards.iter_mut().zip(records.iter()) {
        if card.cta_url.trim().is_empty() {
            card.cta_url = format!("/project/{}", listing.slug());
        }
    }
}
