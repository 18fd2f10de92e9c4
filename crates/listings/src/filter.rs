//! Deterministic metadata filtering.
//!
//! Semantic retrieval is deliberately loose; this module re-checks every
//! candidate against its structured metadata so the final record set
//! satisfies the parsed intent exactly. Embedding similarity alone cannot
//! guarantee a price ceiling or an exact bedroom count.

use crate::intent::FilterIntent;
use crate::types::{Listing, ScoredListing};
use serde_json::Value;

impl FilterIntent {
    /// Filter candidates against their structured metadata.
    ///
    /// Order-preserving: the result is a subsequence of the input. A
    /// candidate is kept only if it passes every present intent field's
    /// check; an absent field imposes no constraint. Idempotent.
    pub fn apply(&self, candidates: Vec<ScoredListing>) -> Vec<ScoredListing> {
        let before = candidates.len();

        let filtered: Vec<ScoredListing> = candidates
            .into_iter()
            .filter(|(listing, _)| self.keep(listing))
            .collect();

        tracing::debug!(
            "Deterministic filter kept {}/{} candidates",
            filtered.len(),
            before
        );

        filtered
    }

    /// Check one candidate against every present constraint.
    fn keep(&self, listing: &Listing) -> bool {
        let md = &listing.metadata;

        // City: metadata city must contain the intent city
        if let Some(ref city) = self.city {
            let md_city = listing.str_field("city").to_lowercase();
            if !md_city.contains(&city.to_lowercase()) {
                return false;
            }
        }

        // Bedroom label: metadata BHK must contain the intent label
        if let Some(ref bhk) = self.bhk {
            let md_bhk = listing.bhk().to_lowercase();
            if !md_bhk.contains(&bhk.to_lowercase()) {
                return false;
            }
        }

        // Budget: price in rupees preferred, else price_in_cr converted.
        // No price at all, or a malformed one, rejects the candidate.
        if let Some(budget) = self.budget_rupees {
            let price_rupees = if let Some(v) = present(md.get("price")) {
                try_parse_number(Some(v))
            } else if let Some(v) = present(md.get("price_in_cr")) {
                try_parse_number(Some(v)).map(|cr| cr * 1e7)
            } else {
                None
            };

            match price_rupees {
                Some(price) if price <= budget => {}
                _ => return false,
            }
        }

        // Status: metadata status must contain the intent status label
        if let Some(status) = self.status {
            let md_status = listing.str_field("status").to_lowercase();
            if !md_status.contains(&status.as_str().to_lowercase()) {
                return false;
            }
        }

        // Locality: the hint must appear in one of locality, address,
        // slug, projectName (checked in that order, first match wins)
        if let Some(ref locality) = self.locality_or_project {
            let needle = locality.to_lowercase();
            let found = ["locality", "address", "slug", "projectName"]
                .iter()
                .any(|key| value_text(md.get(*key)).to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }

        true
    }
}

/// Treat JSON null the same as an absent key.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Coerce a JSON value to a number, treating "unparseable" as a
/// first-class absent value rather than an error.
pub fn try_parse_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render any JSON value as text for substring matching.
fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{parse_query, ConstructionStatus};
    use serde_json::json;

    fn listing(metadata: Value) -> ScoredListing {
        (Listing::new("listing text", metadata), 0.9)
    }

    fn pune_2bhk(price: Value) -> ScoredListing {
        listing(json!({
            "slug": "sunrise-towers-wakad-pune",
            "projectName": "Sunrise Towers",
            "city": "Pune",
            "locality": "Wakad",
            "BHK": "2BHK",
            "status": "READY_TO_MOVE",
            "price": price,
        }))
    }

    #[test]
    fn test_empty_intent_keeps_everything() {
        let intent = FilterIntent::default();
        let candidates = vec![pune_2bhk(json!(7_500_000.0)), listing(json!({}))];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_city_filter() {
        let intent = FilterIntent {
            city: Some("Pune".to_string()),
            ..Default::default()
        };

        let candidates = vec![
            pune_2bhk(json!(7_500_000.0)),
            listing(json!({"city": "Mumbai"})),
            listing(json!({})),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0.str_field("city"), "Pune");
    }

    #[test]
    fn test_bhk_filter_case_insensitive() {
        let intent = FilterIntent {
            bhk: Some("2BHK".to_string()),
            ..Default::default()
        };

        let candidates = vec![
            listing(json!({"bhk": "2bhk"})),
            listing(json!({"BHK": "3BHK"})),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let intent = FilterIntent {
            budget_rupees: Some(8_000_000.0),
            ..Default::default()
        };

        let candidates = vec![
            pune_2bhk(json!(7_500_000.0)),
            pune_2bhk(json!(8_000_000.0)),
            pune_2bhk(json!(9_000_000.0)),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 2);
        for (listing, _) in &filtered {
            let price = try_parse_number(listing.metadata.get("price")).unwrap();
            assert!(price <= 8_000_000.0);
        }
    }

    #[test]
    fn test_budget_uses_price_in_cr_when_price_absent() {
        let intent = FilterIntent {
            budget_rupees: Some(12_000_000.0),
            ..Default::default()
        };

        let candidates = vec![
            listing(json!({"price_in_cr": 1.1})),
            listing(json!({"price_in_cr": 1.5})),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_budget_rejects_missing_or_malformed_price() {
        let intent = FilterIntent {
            budget_rupees: Some(10_000_000.0),
            ..Default::default()
        };

        let candidates = vec![
            listing(json!({})),
            listing(json!({"price": "call for price"})),
            listing(json!({"price": null, "price_in_cr": null})),
        ];

        let filtered = intent.apply(candidates);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_budget_accepts_numeric_string_price() {
        let intent = FilterIntent {
            budget_rupees: Some(10_000_000.0),
            ..Default::default()
        };

        let candidates = vec![listing(json!({"price": "7500000"}))];
        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_status_filter() {
        let intent = FilterIntent {
            status: Some(ConstructionStatus::ReadyToMove),
            ..Default::default()
        };

        let candidates = vec![
            listing(json!({"status": "READY_TO_MOVE"})),
            listing(json!({"status": "UNDER_CONSTRUCTION"})),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_locality_falls_through_slug_and_project_name() {
        let intent = FilterIntent {
            locality_or_project: Some("Wakad".to_string()),
            ..Default::default()
        };

        let candidates = vec![
            listing(json!({"locality": "Wakad"})),
            listing(json!({"slug": "green-acres-wakad-pune"})),
            listing(json!({"projectName": "Wakad Heights"})),
            listing(json!({"locality": "Baner"})),
        ];

        let filtered = intent.apply(candidates);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filter_preserves_order() {
        let intent = FilterIntent {
            city: Some("Pune".to_string()),
            ..Default::default()
        };

        let candidates = vec![
            (Listing::new("a", json!({"city": "Pune", "slug": "a"})), 0.9),
            (Listing::new("b", json!({"city": "Mumbai", "slug": "b"})), 0.8),
            (Listing::new("c", json!({"city": "Pune", "slug": "c"})), 0.7),
        ];

        let filtered = intent.apply(candidates);
        let slugs: Vec<&str> = filtered.iter().map(|(l, _)| l.slug()).collect();
        assert_eq!(slugs, vec!["a", "c"]);
    }

    #[test]
    fn test_filter_idempotent() {
        let intent = parse_query("2bhk under 1.2cr in pune");

        let candidates = vec![
            pune_2bhk(json!(7_500_000.0)),
            pune_2bhk(json!(20_000_000.0)),
            listing(json!({"city": "Mumbai", "BHK": "2BHK", "price": 5_000_000.0})),
        ];

        let once = intent.apply(candidates);
        let twice = intent.apply(once.clone());

        assert_eq!(once.len(), twice.len());
        let once_slugs: Vec<&str> = once.iter().map(|(l, _)| l.slug()).collect();
        let twice_slugs: Vec<&str> = twice.iter().map(|(l, _)| l.slug()).collect();
        assert_eq!(once_slugs, twice_slugs);
    }

    #[test]
    fn test_try_parse_number() {
        assert_eq!(try_parse_number(Some(&json!(42))), Some(42.0));
        assert_eq!(try_parse_number(Some(&json!(1.5))), Some(1.5));
        assert_eq!(try_parse_number(Some(&json!("  750000 "))), Some(750_000.0));
        assert_eq!(try_parse_number(Some(&json!("n/a"))), None);
        assert_eq!(try_parse_number(Some(&json!(null))), None);
        assert_eq!(try_parse_number(Some(&json!([1, 2]))), None);
        assert_eq!(try_parse_number(None), None);
    }
}
