// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::{scheduler::start_scheduler, server::build_app, server::AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_scraper::config::ScraperConfig;
use job_scraper::runner::ScrapeRunner;
use job_scraper::sources::default_sources;
use job_scraper::storage::SqliteJobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,job_scraper=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Remote Job Aggregator API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    if let Some(path) = config.database_path() {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).context("Failed to create database directory")?;
            }
        }
    }

    // Open the store and run migrations
    tracing::info!("Connecting to database...");
    let store = Arc::new(
        SqliteJobStore::connect(&config.database_url)
            .await
            .context("Failed to open job store")?,
    );
    tracing::info!("Database ready");

    // Build the ingestion runner over the production sources
    let scraper_config = ScraperConfig::default();
    let sources = default_sources(&scraper_config).context("Failed to build sources")?;
    let runner = Arc::new(ScrapeRunner::new(store.clone(), sources));

    // Periodic ingestion
    let _scheduler = start_scheduler(runner.clone(), &config.scrape_schedule)
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(AppState {
        store,
        runner,
        scrape_token: config.scrape_token.clone(),
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
