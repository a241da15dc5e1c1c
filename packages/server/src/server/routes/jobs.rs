use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use job_scraper::storage::{JobFilter, JobStore};
use job_scraper::types::{Category, Job, JobId};

use super::ApiError;
use crate::server::app::AppState;

const MAX_LIMIT: i64 = 200;

/// Query parameters for the jobs listing.
#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub category: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub no_phone: bool,
    #[serde(default)]
    pub has_salary: bool,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct JobsResponse {
    pub count: usize,
    pub offset: i64,
    pub jobs: Vec<Job>,
}

/// Job listings with optional filters, most recently scraped first.
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(params): Query<JobsQuery>,
) -> Result<Json<JobsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let category = match params.category.as_deref() {
        Some(raw) => Some(raw.parse::<Category>().map_err(ApiError::bad_request)?),
        None => None,
    };

    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let jobs = match search {
        Some(query) => state.store.search_jobs(query, limit).await?,
        None => {
            state
                .store
                .get_jobs(&JobFilter {
                    category,
                    source: params.source.clone(),
                    no_phone_only: params.no_phone,
                    has_salary: params.has_salary,
                    limit,
                    offset,
                    ..JobFilter::default()
                })
                .await?
        }
    };

    Ok(Json(JobsResponse {
        count: jobs.len(),
        offset,
        jobs,
    }))
}

/// Single job by id.
pub async fn get_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let job = state
        .store
        .get_job(&JobId::from(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    Ok(Json(job))
}
