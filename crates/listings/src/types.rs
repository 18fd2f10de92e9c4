//! Listing domain type definitions.

use serde::{Deserialize, Serialize};

/// Maximum number of result cards in a response payload.
pub const MAX_CARDS: usize = 6;

/// A property listing as stored in the vector index.
///
/// The `content` text is what gets embedded; `metadata` is the structured
/// record produced by the ingestion loader. The two representations are
/// deliberately separate: similarity search operates on the embedding,
/// deterministic filtering and context building operate on the metadata.
/// Listings are immutable at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Text content used for embedding
    pub content: String,

    /// Embedding vector (normalized)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Structured metadata map (slug, projectName, city, locality, BHK,
    /// price, price_in_cr, status, possessionDate, amenities, address, ...)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Listing {
    /// Create a listing from content text and structured metadata.
    pub fn new(content: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            content: content.into(),
            embedding: None,
            metadata,
        }
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Get a metadata field as a string slice, or "" when absent or
    /// not a string.
    pub fn str_field(&self, key: &str) -> &str {
        self.metadata.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Unique listing identifier (the URL slug).
    pub fn slug(&self) -> &str {
        self.str_field("slug")
    }

    /// Bedroom label, accepting either metadata key casing.
    pub fn bhk(&self) -> &str {
        let bhk = self.str_field("BHK");
        if bhk.is_empty() {
            self.str_field("bhk")
        } else {
            bhk
        }
    }

    /// Display title: project name, falling back to slug, then "Unknown".
    pub fn title(&self) -> &str {
        let name = self.str_field("projectName");
        if !name.is_empty() {
            return name;
        }
        let slug = self.slug();
        if !slug.is_empty() {
            return slug;
        }
        "Unknown"
    }
}

/// A listing paired with its similarity score, ordered by descending score.
/// Lives only for the duration of one query.
pub type ScoredListing = (Listing, f32);

/// One structured result card in a response.
///
/// All fields come from the generation step; every field defaults to empty
/// so a card survives partial model output. `cta_url` is guaranteed
/// non-empty after orchestrator post-processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCard {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub city_locality: String,

    #[serde(default)]
    pub bhk: String,

    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub project_name: String,

    #[serde(default)]
    pub possession_status: String,

    /// Up to 3 amenity highlights
    #[serde(default)]
    pub top_amenities: Vec<String>,

    /// Call-to-action URL ("/project/<slug>")
    #[serde(default)]
    pub cta_url: String,
}

/// The complete answer to one query.
///
/// `summary` is never empty; `cards` is empty only when no records were
/// available at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub cards: Vec<ResultCard>,
}

impl ResponsePayload {
    /// Payload returned when both filtered and raw retrieval are empty.
    /// Generation is never invoked for this case.
    pub fn no_alternatives() -> Self {
        Self {
            summary: "No matching properties found and no alternatives available.".to_string(),
            cards: Vec::new(),
        }
    }

    /// Payload returned when the model output could not be parsed as JSON
    /// even after substring extraction.
    pub fn parse_error() -> Self {
        Self {
            summary: "Error: Could not parse LLM output as JSON.".to_string(),
            cards: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_accessors() {
        let listing = Listing::new(
            "2BHK in Wakad, Pune",
            json!({
                "slug": "sunrise-towers-wakad-pune",
                "projectName": "Sunrise Towers",
                "BHK": "2BHK",
                "city": "Pune",
            }),
        );

        assert_eq!(listing.slug(), "sunrise-towers-wakad-pune");
        assert_eq!(listing.title(), "Sunrise Towers");
        assert_eq!(listing.bhk(), "2BHK");
        assert_eq!(listing.str_field("city"), "Pune");
        assert_eq!(listing.str_field("locality"), "");
    }

    #[test]
    fn test_title_fallbacks() {
        let with_slug = Listing::new("x", json!({"slug": "green-acres-pune"}));
        assert_eq!(with_slug.title(), "green-acres-pune");

        let bare = Listing::new("x", json!({}));
        assert_eq!(bare.title(), "Unknown");
    }

    #[test]
    fn test_bhk_lowercase_key() {
        let listing = Listing::new("x", json!({"bhk": "3BHK"}));
        assert_eq!(listing.bhk(), "3BHK");
    }

    #[test]
    fn test_card_deserializes_partial_object() {
        let card: ResultCard =
            serde_json::from_str(r#"{"title": "Sunrise Towers"}"#).unwrap();
        assert_eq!(card.title, "Sunrise Towers");
        assert!(card.cta_url.is_empty());
        assert!(card.top_amenities.is_empty());
    }

    #[test]
    fn test_payload_field_names() {
        let payload = ResponsePayload {
            summary: "Two matches.".to_string(),
            cards: vec![ResultCard::default()],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("summary").is_some());
        assert!(json.get("cards").is_some());
    }

    #[test]
    fn test_no_alternatives_payload() {
        let payload = ResponsePayload::no_alternatives();
        assert_eq!(
            payload.summary,
            "No matching properties found and no alternatives available."
        );
        assert!(payload.cards.is_empty());
    }
}
