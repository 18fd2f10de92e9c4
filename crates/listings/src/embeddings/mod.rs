//! Embedding generation for listing queries.
//!
//! Provides provider-agnostic embedding generation. The active provider is
//! selected by the [`EmbeddingConfig`] persisted beside the listing index,
//! so query-time embeddings always match the ingested vector space.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
