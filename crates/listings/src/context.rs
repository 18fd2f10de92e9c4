//! LLM context assembly.
//!
//! Serializes the chosen records into a compact, unambiguous text block.
//! This block is the only information the generation step is allowed to
//! reference: it is both the grounding mechanism and the hallucination
//! guard.

use crate::filter::try_parse_number;
use crate::types::ScoredListing;

/// Build the records text block, one pipe-delimited line per record in
/// input order.
pub fn build_context(records: &[ScoredListing]) -> String {
    let lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, (listing, _score))| {
            format!(
                "ITEM_{} || title: {} || city: {} || locality: {} || bhk: {} || price: {} || status: {} || possession: {} || amenities: {} || slug: {}",
                i + 1,
                listing.title(),
                listing.str_field("city"),
                listing.str_field("locality"),
                listing.bhk(),
                render_price(listing),
                listing.str_field("status"),
                listing.str_field("possessionDate"),
                listing.str_field("amenities"),
                listing.slug(),
            )
        })
        .collect();

    lines.join("\n")
}

/// Render the price label: crore amount with two decimals when available,
/// else the raw rupee amount, else "N/A".
fn render_price(listing: &crate::types::Listing) -> String {
    let md = &listing.metadata;

    if let Some(cr) = try_parse_number(md.get("price_in_cr")) {
        return format!("₹{:.2} Cr", cr);
    }

    if let Some(price) = try_parse_number(md.get("price")) {
        return format!("₹{}", price as i64);
    }

    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Listing;
    use serde_json::json;

    #[test]
    fn test_line_format() {
        let records = vec![(
            Listing::new(
                "text",
                json!({
                    "slug": "sunrise-towers-wakad-pune",
                    "projectName": "Sunrise Towers",
                    "city": "Pune",
                    "locality": "Wakad",
                    "BHK": "2BHK",
                    "price_in_cr": 0.75,
                    "status": "READY_TO_MOVE",
                    "possessionDate": "Dec 2024",
                    "amenities": "Gym, Pool, Clubhouse",
                }),
            ),
            0.91,
        )];

        let context = build_context(&records);
        assert_eq!(
            context,
            "ITEM_1 || title: Sunrise Towers || city: Pune || locality: Wakad || bhk: 2BHK || price: ₹0.75 Cr || status: READY_TO_MOVE || possession: Dec 2024 || amenities: Gym, Pool, Clubhouse || slug: sunrise-towers-wakad-pune"
        );
    }

    #[test]
    fn test_one_line_per_record_in_order() {
        let records = vec![
            (Listing::new("a", json!({"slug": "first"})), 0.9),
            (Listing::new("b", json!({"slug": "second"})), 0.8),
            (Listing::new("c", json!({"slug": "third"})), 0.7),
        ];

        let context = build_context(&records);
        let lines: Vec<&str> = context.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ITEM_1 "));
        assert!(lines[0].ends_with("slug: first"));
        assert!(lines[1].starts_with("ITEM_2 "));
        assert!(lines[2].starts_with("ITEM_3 "));
        assert!(lines[2].ends_with("slug: third"));
    }

    #[test]
    fn test_price_rendering_fallbacks() {
        let rupees_only = vec![(
            Listing::new("x", json!({"price": 7_500_000.0})),
            0.9,
        )];
        assert!(build_context(&rupees_only).contains("price: ₹7500000 "));

        let no_price = vec![(Listing::new("x", json!({})), 0.9)];
        assert!(build_context(&no_price).contains("price: N/A "));
    }

    #[test]
    fn test_crore_preferred_over_rupees() {
        let both = vec![(
            Listing::new("x", json!({"price": 12_000_000.0, "price_in_cr": 1.2})),
            0.9,
        )];
        assert!(build_context(&both).contains("price: ₹1.20 Cr "));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(build_context(&[]), "");
    }
}
