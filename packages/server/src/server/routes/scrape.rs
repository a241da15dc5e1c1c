use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use job_scraper::runner::SourceReport;

use super::ApiError;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    pub token: String,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub status: &'static str,
    pub results: Vec<SourceReport>,
}

/// Trigger an ingestion run. Guarded by a shared token; runs inline, so
/// the response carries the per-source outcomes.
pub async fn scrape_handler(
    State(state): State<AppState>,
    Query(params): Query<ScrapeQuery>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    if params.token != state.scrape_token {
        return Err(ApiError::forbidden("Invalid token"));
    }

    let results = match params.source.as_deref() {
        Some(name) => vec![state
            .runner
            .run_source(name)
            .await
            .map_err(ApiError::bad_request)?],
        None => state.runner.run_all().await.sources,
    };

    Ok(Json(ScrapeResponse {
        status: "completed",
        results,
    }))
}
