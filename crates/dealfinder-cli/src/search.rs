//! `search` command: run the full pipeline once and print the ranked offers.

use anyhow::Context;
use dealfinder_core::{format_usd, AppConfig, Offer};
use dealfinder_search::{Aggregator, SearchOutcome};

const TITLE_WIDTH: usize = 48;

/// Run a single search and print the offers cheapest first.
///
/// # Errors
///
/// Returns an error if the retailer catalog cannot be loaded, no API key is
/// configured, or every provider call failed.
pub(crate) async fn run_search(
    mut config: AppConfig,
    query: &str,
    json: bool,
    no_enrichment: bool,
) -> anyhow::Result<()> {
    if no_enrichment {
        config.enrichment_enabled = false;
    }
    let catalog = dealfinder_core::load_catalog(&config)?;
    let aggregator = Aggregator::from_config(&config, catalog)
        .context("set SERPAPI_KEY in the environment or .env")?;

    tracing::info!(query, enrichment = config.enrichment_enabled, "searching retailers");
    let outcome = aggregator.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(outcome.offers())?);
        return Ok(());
    }

    match outcome {
        SearchOutcome::NoResults => {
            println!("no offers found for '{query}'; try a different search term");
        }
        SearchOutcome::Offers(offers) => {
            println!("{}", header_row());
            for offer in &offers {
                println!("{}", offer_row(offer));
            }
            println!();
            println!("{}", summary_line(&offers));
        }
    }

    Ok(())
}

fn header_row() -> String {
    format!("{:<10}{:>14}  {:<TITLE_WIDTH$}  URL", "SOURCE", "PRICE", "TITLE")
}

fn offer_row(offer: &Offer) -> String {
    format!(
        "{:<10}{:>14}  {:<TITLE_WIDTH$}  {}",
        offer.source,
        offer.price_display,
        truncate(&offer.title, TITLE_WIDTH),
        offer.url
    )
}

fn summary_line(offers: &[Offer]) -> String {
    let priced = offers.iter().filter_map(|o| o.price_value.known()).count();
    // Offers arrive sorted, so the first known price is the cheapest.
    match offers.iter().find_map(|o| o.price_value.known()) {
        Some(cheapest) => format!(
            "{} offers ({priced} priced), cheapest {}",
            offers.len(),
            format_usd(cheapest)
        ),
        None => format!("{} offers, none with a listed price", offers.len()),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
