//! Grounded summary generation.
//!
//! Builds a strict instructional prompt around the records text, invokes
//! the LLM once, and parses/repairs the returned JSON into a validated
//! [`ResponsePayload`]. The "use only the supplied records" guarantee is
//! enforced by prompt instruction only — it is a trust boundary, not a
//! provable invariant.

use crate::types::{ResponsePayload, MAX_CARDS};
use propchat_core::AppResult;
use propchat_llm::{LlmClient, LlmRequest};
use propchat_prompt::PromptDefinition;
use std::collections::HashMap;
use std::sync::Arc;

/// Temperature for summary generation; low, the output should stick to
/// the supplied records.
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Token budget for the summary plus six cards.
const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Grounded summarizer over an injected LLM client.
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl Summarizer {
    /// Create a summarizer from a shared LLM client, a model identifier
    /// and the grounded summary prompt definition.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }

    /// Generate the summary and cards for a query from the records text.
    ///
    /// One completion call per invocation — there is no retry or
    /// self-correction loop. Malformed model output degrades to a
    /// placeholder payload instead of propagating an error; only
    /// transport-level failures surface as `Err`.
    pub async fn summarize(&self, query: &str, records_text: &str) -> AppResult<ResponsePayload> {
        let mut variables = HashMap::new();
        variables.insert("records".to_string(), records_text.to_string());
        variables.insert("query".to_string(), query.to_string());

        let built = propchat_prompt::build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(SUMMARY_TEMPERATURE)
            .with_max_tokens(SUMMARY_MAX_TOKENS);

        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;

        tracing::debug!("Raw generation output: {}", response.content);

        Ok(parse_payload(&response.content, query))
    }
}

/// Parse the raw model output into a payload, repairing where possible.
///
/// Ladder: direct JSON parse → first-brace-to-last-brace substring →
/// fixed parse-error payload. The parsed summary is never left empty and
/// cards are capped at [`MAX_CARDS`].
fn parse_payload(raw: &str, query: &str) -> ResponsePayload {
    let mut payload = serde_json::from_str::<ResponsePayload>(raw)
        .ok()
        .or_else(|| {
            extract_json_object(raw).and_then(|candidate| serde_json::from_str(candidate).ok())
        })
        .unwrap_or_else(|| {
            tracing::warn!("Could not parse generation output as JSON");
            ResponsePayload::parse_error()
        });

    if payload.summary.trim().is_empty() {
        payload.summary = format!("No matching properties found for '{}'.", query);
    }

    payload.cards.truncate(MAX_CARDS);

    payload
}

/// Extract the first brace-delimited substring of the output.
///
/// Models frequently wrap the JSON object in prose or code fences; the
/// span from the first `{` to the last `}` recovers it.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;

    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propchat_core::AppError;
    use propchat_llm::{LlmResponse, LlmUsage};
    use propchat_prompt::{load_prompt, GROUNDED_SUMMARY_PROMPT_ID};
    use std::path::Path;
    use std::sync::Mutex;

    /// Fake LLM returning a canned response and recording the prompt.
    struct FakeLlm {
        output: String,
        seen_prompts: Mutex<Vec<String>>,
    }

    impl FakeLlm {
        fn new(output: &str) -> Self {
            Self {
                output: output.to_string(),
                seen_prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for FakeLlm {
        fn provider_name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, AppError> {
            self.seen_prompts.lock().unwrap().push(request.prompt.clone());
            Ok(LlmResponse {
                content: self.output.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn summarizer(output: &str) -> (Arc<FakeLlm>, Summarizer) {
        let prompt = load_prompt(Path::new("."), GROUNDED_SUMMARY_PROMPT_ID).unwrap();
        let fake = Arc::new(FakeLlm::new(output));
        let s = Summarizer::new(fake.clone(), "llama-3.1-8b-instant", prompt);
        (fake, s)
    }

    #[tokio::test]
    async fn test_valid_json_passthrough() {
        let (_, s) = summarizer(
            r#"{"summary": "One 2BHK in Wakad under budget.", "cards": [{"title": "Sunrise Towers", "cta_url": "/project/sunrise-towers"}]}"#,
        );

        let payload = s.summarize("2bhk in wakad", "ITEM_1 || ...").await.unwrap();
        assert_eq!(payload.summary, "One 2BHK in Wakad under budget.");
        assert_eq!(payload.cards.len(), 1);
        assert_eq!(payload.cards[0].title, "Sunrise Towers");
    }

    #[tokio::test]
    async fn test_prompt_embeds_records_and_query() {
        let (fake, s) = summarizer(r#"{"summary": "ok", "cards": []}"#);

        s.summarize("2bhk in wakad", "ITEM_1 || title: Sunrise")
            .await
            .unwrap();

        let prompts = fake.seen_prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("ITEM_1 || title: Sunrise"));
        assert!(prompts[0].contains("2bhk in wakad"));
        assert!(prompts[0].contains("ONLY the information"));
    }

    #[tokio::test]
    async fn test_json_recovered_from_prose() {
        let (_, s) = summarizer(
            "Here is the result you asked for:\n```json\n{\"summary\": \"Two matches.\", \"cards\": []}\n```\nHope that helps!",
        );

        let payload = s.summarize("q", "records").await.unwrap();
        assert_eq!(payload.summary, "Two matches.");
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades() {
        let (_, s) = summarizer("I'm sorry, I cannot help with that.");

        let payload = s.summarize("q", "records").await.unwrap();
        assert_eq!(payload.summary, "Error: Could not parse LLM output as JSON.");
        assert!(payload.cards.is_empty());
    }

    #[tokio::test]
    async fn test_empty_summary_replaced() {
        let (_, s) = summarizer(r#"{"summary": "", "cards": []}"#);

        let payload = s.summarize("3bhk in baner", "records").await.unwrap();
        assert_eq!(
            payload.summary,
            "No matching properties found for '3bhk in baner'."
        );
    }

    #[tokio::test]
    async fn test_cards_capped_at_six() {
        let cards: Vec<String> = (0..9)
            .map(|i| format!(r#"{{"title": "Project {}"}}"#, i))
            .collect();
        let output = format!(
            r#"{{"summary": "Nine matches.", "cards": [{}]}}"#,
            cards.join(",")
        );

        let (_, s) = summarizer(&output);
        let payload = s.summarize("q", "records").await.unwrap();
        assert_eq!(payload.cards.len(), 6);
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(
            extract_json_object("noise {\"a\": 1} trailing"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object("} reversed {"), None);
    }
}
