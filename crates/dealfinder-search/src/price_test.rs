use serde_json::json;

use super::*;

fn frag(value: serde_json::Value) -> ResultFragment {
    ResultFragment::new(value)
}

fn extract(value: serde_json::Value) -> Option<ExtractedPrice> {
    extract_price(&frag(value), None, &PriceRange::default())
}

// ---------------------------------------------------------------------------
// StructuredField
// ---------------------------------------------------------------------------

#[test]
fn extracted_price_number_is_used() {
    let price = extract(json!({ "extracted_price": 129.99 })).unwrap();
    assert_eq!(price.value, Decimal::new(12_999, 2));
    assert!(price.display.contains("129.99"));
    assert_eq!(price.strategy, PriceStrategy::StructuredField);
}

#[test]
fn provider_price_string_is_displayed_verbatim() {
    let price = extract(json!({ "price": "  $1,299.00 " })).unwrap();
    assert_eq!(price.value, Decimal::new(1299, 0));
    assert_eq!(price.display, "$1,299.00");
}

#[test]
fn numeric_price_field_is_formatted() {
    let price = extract(json!({ "price": 1299.5 })).unwrap();
    assert_eq!(price.display, "$1,299.50");
}

#[test]
fn extracted_price_wins_over_price_string() {
    let price = extract(json!({ "extracted_price": 19.99, "price": "$24.99" })).unwrap();
    assert_eq!(price.value, Decimal::new(1999, 2));
}

#[test]
fn out_of_range_extracted_price_falls_through_to_price() {
    let price = extract(json!({ "extracted_price": 0, "price": "$24.99" })).unwrap();
    assert_eq!(price.value, Decimal::new(2499, 2));
}

// ---------------------------------------------------------------------------
// RichSnippet
// ---------------------------------------------------------------------------

#[test]
fn rich_snippet_top_then_bottom() {
    let price = extract(json!({
        "rich_snippet": {
            "bottom": { "detected_extensions": { "price": 59.0 } }
        }
    }))
    .unwrap();
    assert_eq!(price.value, Decimal::new(59, 0));
    assert_eq!(price.strategy, PriceStrategy::RichSnippet);

    let price = extract(json!({
        "rich_snippet": {
            "top": { "detected_extensions": { "price": 49.0 } },
            "bottom": { "detected_extensions": { "price": 59.0 } }
        }
    }))
    .unwrap();
    assert_eq!(price.value, Decimal::new(49, 0));
}

// ---------------------------------------------------------------------------
// SnippetRegex
// ---------------------------------------------------------------------------

#[test]
fn snippet_dollar_amount() {
    let price = extract(json!({ "snippet": "Now only $45.00!" })).unwrap();
    assert_eq!(price.value, Decimal::new(4500, 2));
    assert_eq!(price.display, "$45.00");
    assert_eq!(price.strategy, PriceStrategy::SnippetRegex);
}

#[test]
fn snippet_thousands_separator() {
    let price = extract(json!({ "snippet": "List $1,299.99, ships free" })).unwrap();
    assert_eq!(price.value, Decimal::new(129_999, 2));
    assert_eq!(price.display, "$1,299.99");
}

#[test]
fn snippet_usd_suffix() {
    let price = extract(json!({ "snippet": "Only 129.99 USD this week" })).unwrap();
    assert_eq!(price.value, Decimal::new(12_999, 2));
}

#[test]
fn snippet_labeled_price() {
    let price = extract(json!({ "snippet": "In stock. Price: 89.5 (incl. tax)" })).unwrap();
    assert_eq!(price.value, Decimal::new(895, 1));
}

#[test]
fn snippet_without_money_yields_nothing() {
    assert!(extract(json!({ "snippet": "Ergonomic design, 2 year warranty" })).is_none());
}

// ---------------------------------------------------------------------------
// Range validation
// ---------------------------------------------------------------------------

#[test]
fn zero_price_is_rejected() {
    assert!(extract(json!({ "extracted_price": 0 })).is_none());
}

#[test]
fn price_above_max_is_rejected() {
    assert!(extract(json!({ "extracted_price": 250_000 })).is_none());
    let narrow = PriceRange::new(Decimal::new(100, 0));
    assert!(extract_price(&frag(json!({ "extracted_price": 150 })), None, &narrow).is_none());
}

#[test]
fn max_is_inclusive() {
    let price = extract(json!({ "extracted_price": 100_000 })).unwrap();
    assert_eq!(price.value, Decimal::new(100_000, 0));
}

#[test]
fn missing_price_maps_to_check_website() {
    let (display, value) = price_fields(extract(json!({ "title": "Mouse" })).as_ref());
    assert_eq!(display, CHECK_WEBSITE);
    assert_eq!(value, PriceValue::Unknown);
}

// ---------------------------------------------------------------------------
// Enrichment fallback
// ---------------------------------------------------------------------------

#[test]
fn enrichment_price_is_last_resort() {
    let record = EnrichmentRecord {
        link: "https://www.amazon.com/dp/B1".to_string(),
        title: "Mouse".to_string(),
        price: Some(ExtractedPrice {
            display: "$19.99".to_string(),
            value: Decimal::new(1999, 2),
            strategy: PriceStrategy::StructuredField,
        }),
        image: None,
        retailer: Some("Amazon".to_string()),
        product_page: true,
    };

    let price = extract_price(
        &frag(json!({ "snippet": "no price here" })),
        Some(&record),
        &PriceRange::default(),
    )
    .unwrap();
    assert_eq!(price.strategy, PriceStrategy::Enrichment);
    assert_eq!(price.display, "$19.99");

    let own = extract_price(
        &frag(json!({ "extracted_price": 17.0 })),
        Some(&record),
        &PriceRange::default(),
    )
    .unwrap();
    assert_eq!(own.value, Decimal::new(17, 0));
}

#[test]
fn parse_price_text_handles_ranges_and_words() {
    assert_eq!(parse_price_text("$29.99 - $49.99"), Some(Decimal::new(2999, 2)));
    assert_eq!(parse_price_text("From 1,050 USD"), Some(Decimal::new(1050, 0)));
    assert_eq!(parse_price_text("Free"), None);
}
