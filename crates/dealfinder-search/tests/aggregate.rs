//! End-to-end tests for `Aggregator::search` against a stub `SerpAPI`.
//!
//! Each test mounts per-retailer mocks keyed on the `q` parameter and a
//! low-priority catch-all that answers with an empty result page.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealfinder_core::{PriceValue, RetailerCatalog, CHECK_WEBSITE};
use dealfinder_search::{Aggregator, SearchError, SearchOptions, SearchOutcome, SerpApiClient};

fn aggregator(server: &MockServer, options: SearchOptions) -> Aggregator {
    let client = SerpApiClient::with_base_url("test-key", 5, "dealfinder-test/0.1", &server.uri())
        .expect("client construction should not fail");
    Aggregator::new(client, RetailerCatalog::builtin(), options)
}

async fn mount_site(server: &MockServer, query: &str, domain: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .and(query_param("q", format!("{query} site:{domain}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
}

async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({})))
        .with_priority(10)
        .mount(server)
        .await;
}

fn offers(outcome: SearchOutcome) -> Vec<dealfinder_core::Offer> {
    match outcome {
        SearchOutcome::Offers(offers) => offers,
        SearchOutcome::NoResults => panic!("expected offers, got NoResults"),
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wireless_mouse_is_sorted_with_unknown_last() {
    let server = MockServer::start().await;

    mount_site(
        &server,
        "wireless mouse",
        "amazon.com",
        json!({ "organic_results": [
            { "title": "Mouse A", "link": "https://www.amazon.com/dp/A", "extracted_price": 20.0 }
        ]}),
    )
    .await;
    mount_site(
        &server,
        "wireless mouse",
        "walmart.com",
        json!({ "organic_results": [
            { "title": "Mouse B", "link": "https://www.walmart.com/ip/B", "extracted_price": 0 }
        ]}),
    )
    .await;
    mount_site(
        &server,
        "wireless mouse",
        "ebay.com",
        json!({ "organic_results": [
            { "title": "Mouse C", "link": "https://www.ebay.com/itm/C", "snippet": "Buy it now $15.00" }
        ]}),
    )
    .await;
    mount_empty_fallback(&server).await;

    let result = aggregator(&server, SearchOptions::default())
        .search("  wireless mouse ")
        .await
        .expect("search should succeed");
    let offers = offers(result);

    let prices: Vec<PriceValue> = offers.iter().map(|o| o.price_value).collect();
    assert_eq!(
        prices,
        [
            PriceValue::Known(Decimal::new(15, 0)),
            PriceValue::Known(Decimal::new(20, 0)),
            PriceValue::Unknown,
        ]
    );
    assert_eq!(offers[0].source, "eBay");
    assert_eq!(offers[1].price_display, "$20.00");
    // A listed price outside the valid range is dropped, not shown.
    assert_eq!(offers[2].source, "Walmart");
    assert_eq!(offers[2].price_display, CHECK_WEBSITE);
}

#[tokio::test]
async fn enrichment_fills_gaps_and_dedupes() {
    let server = MockServer::start().await;

    mount_site(
        &server,
        "mouse",
        "target.com",
        json!({ "organic_results": [
            { "title": "Target Mouse", "link": "https://www.target.com/p/mouse/-/A-1#reviews" },
            { "title": "Mice", "link": "https://www.target.com/c/computer-mice/-/N-5xtfc" }
        ]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(query_param("engine", "google_shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "shopping_results": [
                {
                    "title": "Target Mouse (shopping)",
                    "link": "https://www.target.com/p/mouse/-/A-1",
                    "extracted_price": 12.99,
                    "thumbnail": "https://img.example/t.jpg"
                },
                { "title": "Elsewhere", "link": "https://shop.example/p/9", "extracted_price": 1.0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_fallback(&server).await;

    let offers = offers(
        aggregator(&server, SearchOptions::default())
            .search("mouse")
            .await
            .unwrap(),
    );

    assert_eq!(offers.len(), 1, "got: {offers:?}");
    assert_eq!(offers[0].url, "https://www.target.com/p/mouse/-/A-1");
    assert_eq!(offers[0].price_value, PriceValue::Known(Decimal::new(1299, 2)));
    assert_eq!(offers[0].image.as_deref(), Some("https://img.example/t.jpg"));
}

// ---------------------------------------------------------------------------
// Outcomes and failure policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_pages_yield_no_results() {
    let server = MockServer::start().await;
    mount_empty_fallback(&server).await;

    let outcome = aggregator(&server, SearchOptions::default())
        .search("nothing matches")
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::NoResults);
}

#[tokio::test]
async fn blank_query_never_calls_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = aggregator(&server, SearchOptions::default())
        .search("   ")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::EmptyQuery));
}

#[tokio::test]
async fn single_failure_degrades_to_partial_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("q", "mouse site:amazon.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_site(
        &server,
        "mouse",
        "newegg.com",
        json!({ "organic_results": [
            { "title": "Newegg Mouse", "link": "https://www.newegg.com/p/N82E1", "price": "$9.99" }
        ]}),
    )
    .await;
    mount_empty_fallback(&server).await;

    let offers = offers(
        aggregator(&server, SearchOptions::default())
            .search("mouse")
            .await
            .unwrap(),
    );
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].source, "Newegg");
    assert_eq!(offers[0].price_display, "$9.99");
}

#[tokio::test]
async fn all_calls_failing_at_transport_level_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = aggregator(&server, SearchOptions::default())
        .search("mouse")
        .await
        .unwrap_err();
    assert!(
        matches!(err, SearchError::Unavailable { attempted: 7, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn all_calls_rejected_by_provider_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({ "error": "Invalid API key." })),
        )
        .mount(&server)
        .await;

    let err = aggregator(&server, SearchOptions::default())
        .search("mouse")
        .await
        .unwrap_err();
    assert!(
        matches!(err, SearchError::Provider { ref message } if message == "Invalid API key."),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn disabled_enrichment_skips_shopping_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("engine", "google_shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({})))
        .expect(6)
        .mount(&server)
        .await;

    let options = SearchOptions {
        enrichment_enabled: false,
        ..SearchOptions::default()
    };
    let outcome = aggregator(&server, options).search("mouse").await.unwrap();
    assert_eq!(outcome, SearchOutcome::NoResults);
}
