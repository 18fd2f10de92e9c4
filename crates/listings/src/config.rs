//! Workspace path helpers for the listing pipeline.
//!
//! All persisted state lives under `<workspace>/.propchat/`: the LanceDB
//! listing index and the embedding configuration written beside it by the
//! ingestion loader.

use std::path::{Path, PathBuf};

/// Get the `.propchat` state directory for a workspace.
pub fn propchat_dir(workspace: &Path) -> PathBuf {
    workspace.join(".propchat")
}

/// Get the LanceDB listing index path.
pub fn get_index_path(workspace: &Path) -> PathBuf {
    propchat_dir(workspace).join("index")
}

/// Get the embedding configuration path.
///
/// The config is persisted beside the index at ingestion time so that
/// query-time embeddings always use the same provider, model and
/// dimensionality as the ingested vectors.
pub fn get_embedding_config_path(workspace: &Path) -> PathBuf {
    propchat_dir(workspace).join("embeddings.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_propchat_dir() {
        let workspace = Path::new("/srv/portal");

        assert_eq!(
            get_index_path(workspace),
            PathBuf::from("/srv/portal/.propchat/index")
        );
        assert_eq!(
            get_embedding_config_path(workspace),
            PathBuf::from("/srv/portal/.propchat/embeddings.yaml")
        );
    }
}
