use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use job_scraper::storage::{JobFilter, JobStats, JobStore};
use job_scraper::types::{Category, Job};

use super::ApiError;
use crate::server::app::AppState;

/// Categories surfaced first in the curated no-phone feed.
const FEED_CATEGORIES: &[Category] = &[
    Category::Support,
    Category::DataEntry,
    Category::Moderation,
    Category::Va,
    Category::Writing,
];

#[derive(Serialize)]
pub struct CategoryEntry {
    pub name: String,
    pub count: i64,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryEntry>,
}

/// Category names with active-job counts.
pub async fn categories_handler(
    State(state): State<AppState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let stats = state.store.get_stats().await?;
    let mut categories: Vec<CategoryEntry> = stats
        .by_category
        .into_iter()
        .map(|(name, count)| CategoryEntry { name, count })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(Json(CategoriesResponse { categories }))
}

#[derive(Serialize)]
pub struct SourceEntry {
    pub name: String,
    pub count: i64,
    pub last_scrape: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceEntry>,
}

/// Source names with counts and last scrape times.
pub async fn sources_handler(
    State(state): State<AppState>,
) -> Result<Json<SourcesResponse>, ApiError> {
    let stats = state.store.get_stats().await?;
    let sources = stats
        .by_source
        .iter()
        .map(|(name, count)| SourceEntry {
            name: name.clone(),
            count: *count,
            last_scrape: stats.last_scrape.get(name).copied(),
        })
        .collect();
    Ok(Json(SourcesResponse { sources }))
}

/// Aggregate statistics.
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<JobStats>, ApiError> {
    Ok(Json(state.store.get_stats().await?))
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub count: usize,
    pub jobs: Vec<Job>,
}

/// Curated feed of no-phone postings, favouring the categories where
/// phone-free work is most common.
pub async fn no_phone_feed_handler(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let mut jobs: Vec<Job> = Vec::new();
    let mut seen = HashSet::new();

    for category in FEED_CATEGORIES {
        let batch = state
            .store
            .get_jobs(&JobFilter {
                category: Some(*category),
                no_phone_only: true,
                limit,
                ..JobFilter::default()
            })
            .await?;
        for job in batch {
            if seen.insert(job.id.clone()) {
                jobs.push(job);
            }
        }
    }

    // Fill from the remaining categories.
    let rest = state
        .store
        .get_jobs(&JobFilter {
            no_phone_only: true,
            limit,
            ..JobFilter::default()
        })
        .await?;
    for job in rest {
        if seen.insert(job.id.clone()) {
            jobs.push(job);
        }
    }

    jobs.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
    jobs.truncate(limit as usize);

    Ok(Json(FeedResponse {
        count: jobs.len(),
        jobs,
    }))
}
