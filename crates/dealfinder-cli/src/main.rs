mod catalog;
mod search;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealfinder-cli")]
#[command(about = "Compare product prices across major retailers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every retailer and print offers cheapest first
    Search {
        /// Product query, e.g. `wireless mouse`
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print offers as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Skip the shopping enrichment call
        #[arg(long)]
        no_enrichment: bool,
    },
    /// List the retailers searched and their product URL patterns
    Retailers,
    /// Show which retailer owns a URL and whether it is a product page
    Classify {
        /// Absolute URL to classify
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = dealfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Search {
            query,
            json,
            no_enrichment,
        }) => search::run_search(config, &query.join(" "), json, no_enrichment).await?,
        Some(Commands::Retailers) => catalog::run_retailers(&config)?,
        Some(Commands::Classify { url }) => catalog::run_classify(&config, &url)?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}
