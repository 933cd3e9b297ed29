mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use dealfinder_core::{InMemorySessionStore, QuotaLimits, QuotaService, SystemClock};
use dealfinder_search::{Aggregator, SearchError};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dealfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting dealfinder-server");

    let catalog = dealfinder_core::load_catalog(&config)?;
    let search = match Aggregator::from_config(&config, catalog) {
        Ok(aggregator) => Some(Arc::new(aggregator)),
        Err(SearchError::MissingCredentials) => {
            tracing::warn!("SERPAPI_KEY not set; /api/search will answer config_error");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let quota = Arc::new(QuotaService::new(
        InMemorySessionStore::new(),
        SystemClock,
        QuotaLimits::from_config(&config),
    ));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&quota)).await?;

    let app = build_app(
        AppState { search, quota },
        rate_limit_state(config.rate_limit_per_minute),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
