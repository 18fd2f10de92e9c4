//! Stats command handler.
//!
//! Reports the state of the persisted listing index.

use clap::Args;
use propchat_core::{config::AppConfig, AppResult};
use propchat_listings::config::get_index_path;
use propchat_listings::embeddings::EmbeddingConfig;
use propchat_listings::lancedb_index::LanceDbListings;
use propchat_listings::vector_index::ListingIndex;

/// Show listing index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let embedding_config = EmbeddingConfig::load(&config.workspace)?;
        let index_path = get_index_path(&config.workspace);

        let index = LanceDbListings::open(&index_path, embedding_config.dimensions).await?;
        let count = index.count()?;

        if self.json {
            let output = serde_json::json!({
                "indexPath": index_path.display().to_string(),
                "listings": count,
                "embedding": {
                    "provider": embedding_config.provider,
                    "model": embedding_config.model,
                    "dimensions": embedding_config.dimensions,
                },
            });

            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| propchat_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Listing index: {}", index_path.display());
            println!("Listings: {}", count);
            println!(
                "Embedding: {} ({}, {} dims)",
                embedding_config.provider, embedding_config.model, embedding_config.dimensions
            );
        }

        Ok(())
    }
}
