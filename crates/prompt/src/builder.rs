//! Prompt builder for rendering templates with variables.

use crate::types::{BuiltPrompt, PromptDefinition};
use propchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the template using Handlebars with the provided variables and
/// returns a `BuiltPrompt` ready for LLM execution. The whole rendered
/// template is the user message; the grounding instructions are part of
/// the template itself.
///
/// # Example
/// ```no_run
/// use propchat_prompt::{build_prompt, load_prompt, GROUNDED_SUMMARY_PROMPT_ID};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), GROUNDED_SUMMARY_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("records".to_string(), "ITEM_1 || ...".to_string());
/// vars.insert("query".to_string(), "2BHK in Pune".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        None,
        rendered,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
