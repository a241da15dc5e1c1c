//! Storage contract for canonical jobs and scrape-run accounting.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Category, Job, JobId, ScrapeRun, ScrapeStatus};

pub mod sqlite;

pub use sqlite::SqliteJobStore;

/// Result of an upsert: at most one of the flags is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertOutcome {
    pub is_new: bool,
    /// True only when title or a salary bound differs from the stored
    /// record; description/location/tag/category churn is persisted but
    /// not reported.
    pub is_updated: bool,
}

/// Filters for the jobs listing.
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub category: Option<Category>,
    pub source: Option<String>,
    pub no_phone_only: bool,
    pub has_salary: bool,
    pub limit: i64,
    pub offset: i64,
    pub active_only: bool,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            category: None,
            source: None,
            no_phone_only: false,
            has_salary: false,
            limit: 100,
            offset: 0,
            active_only: true,
        }
    }
}

/// Aggregate statistics over active jobs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    pub total_jobs: i64,
    pub no_phone_jobs: i64,
    pub with_salary: i64,
    pub by_source: BTreeMap<String, i64>,
    pub by_category: BTreeMap<String, i64>,
    pub last_scrape: BTreeMap<String, DateTime<Utc>>,
}

/// Durable keyed collection of canonical jobs plus the scrape-run log.
///
/// `upsert_job` and `finish_run` must be atomic per call; readers never
/// observe a partially written record.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or overwrite a job, detecting meaningful change.
    ///
    /// Upserting byte-identical input twice yields `is_new` then neither
    /// flag.
    async fn upsert_job(&self, job: &Job) -> Result<UpsertOutcome>;

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>>;

    /// Filtered listing, most recently scraped first.
    async fn get_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;

    /// Substring search over title, description and company.
    async fn search_jobs(&self, query: &str, limit: i64) -> Result<Vec<Job>>;

    async fn get_stats(&self) -> Result<JobStats>;

    /// Record the start of a scrape run; returns the run id.
    async fn start_run(&self, source: &str) -> Result<i64>;

    /// Finalize a run exactly once; later calls for the same id are
    /// ignored.
    async fn finish_run(
        &self,
        run_id: i64,
        found: i64,
        new: i64,
        updated: i64,
        status: ScrapeStatus,
        error: Option<&str>,
    ) -> Result<()>;

    /// Most recent runs, newest first.
    async fn list_runs(&self, limit: i64) -> Result<Vec<ScrapeRun>>;
}
