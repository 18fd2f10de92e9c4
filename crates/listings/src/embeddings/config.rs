//! Embedding configuration.

use crate::config::get_embedding_config_path;
use propchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the embedding provider.
///
/// Persisted to `.propchat/embeddings.yaml` by the ingestion loader and
/// reloaded at query time, so both sides of the index agree on the
/// embedding space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name ("ollama", "trigram")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimension
    pub dimensions: usize,

    /// Normalize vectors to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Batch size for bulk embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_normalize() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            normalize: true,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Load the embedding config for a workspace, falling back to the
    /// default when no file has been written yet.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let config_path = get_embedding_config_path(workspace);

        if !config_path.exists() {
            tracing::debug!(
                "No embedding config at {:?}, using defaults",
                config_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Listings(format!(
                "Failed to read embedding config at {:?}: {}",
                config_path, e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Listings(format!(
                "Failed to parse embedding config at {:?}: {}",
                config_path, e
            ))
        })?;

        tracing::debug!(
            "Loaded embedding config: provider={}, model={}, dimensions={}",
            config.provider,
            config.model,
            config.dimensions
        );

        Ok(config)
    }

    /// Save the embedding config for a workspace.
    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let config_path = get_embedding_config_path(workspace);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Listings(format!("Failed to create config directory: {}", e))
            })?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| AppError::Listings(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, yaml).map_err(|e| {
            AppError::Listings(format!("Failed to write config to {:?}: {}", config_path, e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let config = EmbeddingConfig::load(temp.path()).unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.dimensions, 768);
        assert!(config.normalize);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();

        let config = EmbeddingConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            normalize: true,
            batch_size: 50,
        };
        config.save(temp.path()).unwrap();

        let loaded = EmbeddingConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.provider, "trigram");
        assert_eq!(loaded.dimensions, 384);
        assert_eq!(loaded.batch_size, 50);
    }
}
