//! Grounded listing search pipeline.
//!
//! Answers free-text real-estate queries by combining semantic retrieval
//! over a vector index of property listings with deterministic metadata
//! filtering, then asking an LLM to summarize only the surviving records
//! into a grounded answer plus structured cards.
//!
//! Pipeline stages, in order:
//! 1. [`intent::parse_query`] — free text to structured filter intent
//! 2. [`retriever::SemanticRetriever`] — top-k similarity candidates
//! 3. [`intent::FilterIntent::apply`] — deterministic metadata re-filter
//! 4. [`context::build_context`] — bounded, unambiguous records text
//! 5. [`summarize::Summarizer`] — grounded summary + cards with JSON repair
//! 6. [`pipeline::QueryPipeline`] — composition, fallbacks, link patching

pub mod config;
pub mod context;
pub mod embeddings;
pub mod filter;
pub mod intent;
pub mod lancedb_index;
pub mod pipeline;
pub mod retriever;
pub mod summarize;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use intent::{parse_query, ConstructionStatus, FilterIntent};
pub use pipeline::{QueryPipeline, DEFAULT_TOP_K};
pub use types::{Listing, ResponsePayload, ResultCard, ScoredListing, MAX_CARDS};

use crate::embeddings::EmbeddingConfig;
use crate::lancedb_index::LanceDbListings;
use crate::retriever::SemanticRetriever;
use crate::summarize::Summarizer;
use propchat_core::config::ProviderConfig;
use propchat_core::{AppConfig, AppError, AppResult};
use propchat_prompt::{load_prompt, GROUNDED_SUMMARY_PROMPT_ID};
use std::sync::Arc;

/// Open the persisted listing index and assemble the full query pipeline.
///
/// Called once at process start; the returned pipeline is shared read-only
/// across all queries. Fails with a configuration error — the process must
/// not serve queries — when the persisted index is missing.
pub async fn open_pipeline(config: &AppConfig) -> AppResult<QueryPipeline> {
    let workspace = &config.workspace;

    // Embedding space must match the ingested index
    let embedding_config = EmbeddingConfig::load(workspace)?;

    let index_path = config::get_index_path(workspace);
    let index = LanceDbListings::open(&index_path, embedding_config.dimensions).await?;

    {
        use crate::vector_index::ListingIndex;
        tracing::info!(
            "Opened listing index at {:?} ({} listings)",
            index_path,
            index.count().unwrap_or(0)
        );
    }

    let embedder = embeddings::create_provider(&embedding_config).await?;

    let provider_config = config.get_provider_config(&config.provider)?;
    let endpoint = provider_config.as_ref().and_then(|pc| match pc {
        ProviderConfig::Groq { endpoint, .. } => endpoint.as_deref(),
        ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
    });

    let api_key = config.resolve_api_key(&config.provider)?;
    let client = propchat_llm::create_client(&config.provider, endpoint, api_key.as_deref())
        .map_err(AppError::Config)?;

    let prompt = load_prompt(workspace, GROUNDED_SUMMARY_PROMPT_ID)?;
    let summarizer = Summarizer::new(client, &config.model, prompt);

    let retriever = Arc::new(SemanticRetriever::new(Arc::new(index), embedder));

    Ok(QueryPipeline::new(retriever, summarizer))
}
