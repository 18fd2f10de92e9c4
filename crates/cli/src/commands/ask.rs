//! Ask command handler.
//!
//! Answers a single free-text query against the listing index.

use clap::Args;
use propchat_core::{config::AppConfig, AppResult};
use propchat_listings::{open_pipeline, DEFAULT_TOP_K};

/// Answer a single query
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The query to answer (e.g., "2BHK under 80L in Pune ready to move")
    pub query: String,

    /// Number of candidates fetched by semantic search
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output the full payload (summary + cards) as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        config.validate()?;

        let pipeline = open_pipeline(config).await?;

        let payload = pipeline.handle_top_k(&self.query, self.top_k).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&payload)
                .map_err(|e| propchat_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", payload.summary);

            if !payload.cards.is_empty() {
                tracing::debug!("{} cards attached to response", payload.cards.len());
            }
        }

        Ok(())
    }
}
