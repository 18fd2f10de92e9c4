//! Free-text query interpretation.
//!
//! Parses a raw query string into a structured [`FilterIntent`]. The five
//! extractions (budget, bedroom count, city, construction status,
//! locality/project hint) are independent and order-insensitive; a field
//! that fails to match is simply absent, which means "no constraint".
//!
//! The whole layer is regex heuristics by design. Known imprecision: the
//! "ready" status match is a broad substring check and will fire on words
//! that merely contain "ready"; the bare-integer budget fallback can pick
//! up any 6+ digit token.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Construction status constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstructionStatus {
    ReadyToMove,
    UnderConstruction,
}

impl ConstructionStatus {
    /// Canonical label, matching the ingestion metadata vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadyToMove => "READY_TO_MOVE",
            Self::UnderConstruction => "UNDER_CONSTRUCTION",
        }
    }
}

/// Structured filter derived from one query string.
///
/// Every field is either a validated extracted value or absent; absence
/// means unconstrained, never "excluded".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterIntent {
    /// Budget ceiling in rupees
    pub budget_rupees: Option<f64>,

    /// Bedroom label, e.g. "2BHK"
    pub bhk: Option<String>,

    /// Canonical city name, e.g. "Pune"
    pub city: Option<String>,

    /// Construction status constraint
    pub status: Option<ConstructionStatus>,

    /// Locality or project name hint, title-cased
    pub locality_or_project: Option<String>,
}

impl FilterIntent {
    /// Check whether any constraint was extracted.
    pub fn has_filters(&self) -> bool {
        self.budget_rupees.is_some()
            || self.bhk.is_some()
            || self.city.is_some()
            || self.status.is_some()
            || self.locality_or_project.is_some()
    }
}

/// Known city names and their canonical forms. The alternate romanizations
/// of Bangalore normalize to the same canonical name.
const CITIES: &[(&str, &str)] = &[
    ("pune", "Pune"),
    ("mumbai", "Mumbai"),
    ("delhi", "Delhi"),
    ("bangalore", "Bangalore"),
    ("bengaluru", "Bangalore"),
    ("bangaluru", "Bangalore"),
    ("chennai", "Chennai"),
    ("hyderabad", "Hyderabad"),
    ("kolkata", "Kolkata"),
];

static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"under\s*[₹rs\.]*\s*([0-9]+(?:\.[0-9]+)?)\s*(cr|crore|l|lakhs|lakh|k)?")
        .expect("budget pattern")
});

static BARE_AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{6,})").expect("bare amount pattern"));

static BHK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*-?\s*bhk").expect("bhk pattern"));

static LOCALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:in|near|at)\s+([a-z0-9\- ]{3,30})").expect("locality pattern")
});

/// Words that end a locality capture because they belong to another
/// extractor (budget marker, status keywords).
const LOCALITY_STOP_WORDS: &[&str] = &["under", "ready", "uc"];

/// Parse a free-text query into a structured filter intent.
pub fn parse_query(query: &str) -> FilterIntent {
    let intent = FilterIntent {
        budget_rupees: parse_budget(query),
        bhk: parse_bhk(query),
        city: parse_city(query),
        status: parse_status(query),
        locality_or_project: parse_locality_or_project(query),
    };

    tracing::debug!("Parsed intent from query '{}': {:?}", query, intent);

    intent
}

/// Parse budgets like "under ₹1.2 Cr", "under 80l", "under 12000000".
///
/// Returns the numeric rupee value. Units: cr/crore ×1e7, l/lakh/lakhs
/// ×1e5, k ×1e3, no unit = raw rupees. Falls back to the first bare
/// integer of 6+ digits.
pub fn parse_budget(text: &str) -> Option<f64> {
    let normalized = text.replace(',', "").to_lowercase();

    if let Some(caps) = BUDGET_RE.captures(&normalized) {
        let num: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let value = match unit {
            "cr" | "crore" => num * 1e7,
            "l" | "lakh" | "lakhs" => num * 1e5,
            "k" => num * 1e3,
            _ => num,
        };
        return Some(value);
    }

    BARE_AMOUNT_RE
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse a bedroom label like "2bhk", "2 BHK" or "2-bhk" into "2BHK".
pub fn parse_bhk(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    BHK_RE
        .captures(&lowered)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}BHK", m.as_str()))
}

/// Detect a known city name as a substring and return its canonical form.
pub fn parse_city(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    CITIES
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|(_, canonical)| canonical.to_string())
}

/// Detect readiness intent. "ready" wins when both appear.
pub fn parse_status(text: &str) -> Option<ConstructionStatus> {
    let lowered = text.to_lowercase();

    // Broad substring checks, including "uc" as shorthand
    if lowered.contains("ready") {
        return Some(ConstructionStatus::ReadyToMove);
    }
    if lowered.contains("under construction")
        || lowered.contains("under-construction")
        || lowered.contains("uc")
    {
        return Some(ConstructionStatus::UnderConstruction);
    }

    None
}

/// Pick up a locality or project hint following "in", "near" or "at".
///
/// The capture is cut short at the first word owned by another extractor,
/// so "in pune ready to move" yields "Pune" rather than swallowing the
/// status phrase. Only the first match is used.
pub fn parse_locality_or_project(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let captured = LOCALITY_RE
        .captures(&lowered)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())?;

    let kept: Vec<&str> = captured
        .split_whitespace()
        .take_while(|w| !LOCALITY_STOP_WORDS.contains(w))
        .collect();

    if kept.is_empty() {
        return None;
    }

    Some(title_case(&kept.join(" ")))
}

/// Title-case a phrase: uppercase every letter that follows a non-letter.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;

    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}
