//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use job_scraper::runner::ScrapeRunner;
use job_scraper::storage::SqliteJobStore;

use crate::server::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteJobStore>,
    pub runner: Arc<ScrapeRunner>,
    pub scrape_token: String,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/api/jobs", get(routes::list_jobs_handler))
        .route("/api/jobs/:id", get(routes::get_job_handler))
        .route("/api/categories", get(routes::categories_handler))
        .route("/api/sources", get(routes::sources_handler))
        .route("/api/stats", get(routes::stats_handler))
        .route("/api/no-phone-feed", get(routes::no_phone_feed_handler))
        .route("/api/scrape", post(routes::scrape_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
