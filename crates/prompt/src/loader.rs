//! Prompt loader for YAML prompt definitions.
//!
//! Definitions resolve in two steps: a workspace override under
//! `.propchat/prompts/<id>.yml` wins when present, otherwise the built-in
//! definition compiled into the binary is used.

use crate::types::PromptDefinition;
use propchat_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the built-in grounded summary prompt.
pub const GROUNDED_SUMMARY_PROMPT_ID: &str = "listing.summary.grounded";

/// Built-in prompt definitions shipped with the binary.
const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    GROUNDED_SUMMARY_PROMPT_ID,
    include_str!("../prompts/listing.summary.grounded.yml"),
)];

/// Load a prompt definition by ID.
///
/// Searches `.propchat/prompts/<id>.yml` in the workspace first, then
/// falls back to the built-in definition with that ID.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.propchat/`
/// * `prompt_id` - Prompt identifier (e.g., "listing.summary.grounded")
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".propchat/prompts")
        .join(format!("{}.yml", prompt_id));

    let contents = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from {:?}", prompt_file);
        std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?
    } else {
        BUILTIN_PROMPTS
            .iter()
            .find(|(id, _)| *id == prompt_id)
            .map(|(_, yaml)| yaml.to_string())
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?
    };

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt '{}': {}", prompt_id, e)))?;

    validate_prompt(&definition)?;

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs: built-ins plus workspace overrides.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let prompts_dir = workspace_path.join(".propchat/prompts");
    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_builtin_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), GROUNDED_SUMMARY_PROMPT_ID).unwrap();

        assert_eq!(prompt.id, GROUNDED_SUMMARY_PROMPT_ID);
        assert!(prompt.template.contains("{{records}}"));
        assert!(prompt.template.contains("{{query}}"));
        assert!(prompt.template.contains("ONLY the information"));
        assert_eq!(prompt.output.format, "json");
    }

    #[test]
    fn test_load_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        let prompts_dir = temp_dir.path().join(".propchat/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();

        let yaml = r#"
id: listing.summary.grounded
title: "Override"
apiVersion: "1.0"
createdBy: test
behavior:
  tone: helpful
  style: concise
template: "OVERRIDE {{records}} {{query}}"
output:
  format: json
"#;
        fs::write(
            prompts_dir.join("listing.summary.grounded.yml"),
            yaml,
        )
        .unwrap();

        let prompt = load_prompt(temp_dir.path(), GROUNDED_SUMMARY_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Override");
        assert!(prompt.template.starts_with("OVERRIDE"));
    }

    #[test]
    fn test_list_prompts_includes_builtins() {
        let temp_dir = TempDir::new().unwrap();
        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert!(prompts.contains(&GROUNDED_SUMMARY_PROMPT_ID.to_string()));
    }
}
