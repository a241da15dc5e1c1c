//! SQLite implementation of the job store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

use super::{JobFilter, JobStats, JobStore, UpsertOutcome};
use crate::types::{Job, JobId, ScrapeRun, ScrapeStatus};

/// Embedded schema migrations for the job store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `url`, creating it if missing, and run
    /// migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .context("Invalid database url")?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn job_from_row(row: &SqliteRow) -> Job {
        let tags: Vec<String> =
            serde_json::from_str(&row.get::<String, _>("tags")).unwrap_or_default();
        Job {
            id: JobId::from(row.get::<String, _>("id")),
            source: row.get("source"),
            source_id: row.get("source_id"),
            title: row.get("title"),
            company: row.get("company"),
            company_logo: row.get("company_logo"),
            description: row.get("description"),
            location: row.get("location"),
            salary_min: row.get("salary_min"),
            salary_max: row.get("salary_max"),
            salary_currency: row.get("salary_currency"),
            url: row.get("url"),
            apply_url: row.get("apply_url"),
            tags,
            category: row
                .get::<String, _>("category")
                .parse()
                .unwrap_or_default(),
            is_no_phone: row.get("is_no_phone"),
            posted_at: row.get("posted_at"),
            scraped_at: row.get("scraped_at"),
            updated_at: row.get("updated_at"),
            is_active: row.get("is_active"),
        }
    }

    fn run_from_row(row: &SqliteRow) -> ScrapeRun {
        ScrapeRun {
            id: row.get("id"),
            source: row.get("source"),
            started_at: row.get("started_at"),
            finished_at: row.get("finished_at"),
            jobs_found: row.get("jobs_found"),
            jobs_new: row.get("jobs_new"),
            jobs_updated: row.get("jobs_updated"),
            status: row
                .get::<String, _>("status")
                .parse()
                .unwrap_or(ScrapeStatus::Error),
            error: row.get("error"),
        }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn upsert_job(&self, job: &Job) -> Result<UpsertOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin upsert transaction")?;

        let existing =
            sqlx::query("SELECT title, salary_min, salary_max FROM jobs WHERE id = ?")
                .bind(job.id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to look up job")?;

        let now = Utc::now();
        let tags = serde_json::to_string(&job.tags)?;

        let outcome = match existing {
            Some(row) => {
                sqlx::query(
                    r#"
                    UPDATE jobs SET
                        title = ?, company = ?, company_logo = ?, description = ?,
                        location = ?, salary_min = ?, salary_max = ?,
                        salary_currency = ?, url = ?, apply_url = ?, tags = ?,
                        category = ?, is_no_phone = ?, updated_at = ?, is_active = 1
                    WHERE id = ?
                    "#,
                )
                .bind(&job.title)
                .bind(&job.company)
                .bind(&job.company_logo)
                .bind(&job.description)
                .bind(&job.location)
                .bind(job.salary_min)
                .bind(job.salary_max)
                .bind(&job.salary_currency)
                .bind(&job.url)
                .bind(&job.apply_url)
                .bind(&tags)
                .bind(job.category.as_str())
                .bind(job.is_no_phone)
                .bind(now)
                .bind(job.id.as_str())
                .execute(&mut *tx)
                .await
                .context("Failed to update job")?;

                let changed = row.get::<String, _>("title") != job.title
                    || row.get::<Option<i64>, _>("salary_min") != job.salary_min
                    || row.get::<Option<i64>, _>("salary_max") != job.salary_max;
                UpsertOutcome {
                    is_new: false,
                    is_updated: changed,
                }
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO jobs (
                        id, source, source_id, title, company, company_logo,
                        description, location, salary_min, salary_max,
                        salary_currency, url, apply_url, tags, category,
                        is_no_phone, posted_at, scraped_at, updated_at, is_active
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
                    "#,
                )
                .bind(job.id.as_str())
                .bind(&job.source)
                .bind(&job.source_id)
                .bind(&job.title)
                .bind(&job.company)
                .bind(&job.company_logo)
                .bind(&job.description)
                .bind(&job.location)
                .bind(job.salary_min)
                .bind(job.salary_max)
                .bind(&job.salary_currency)
                .bind(&job.url)
                .bind(&job.apply_url)
                .bind(&tags)
                .bind(job.category.as_str())
                .bind(job.is_no_phone)
                .bind(job.posted_at)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await
                .context("Failed to insert job")?;

                UpsertOutcome {
                    is_new: true,
                    is_updated: false,
                }
            }
        };

        tx.commit().await.context("Failed to commit upsert")?;
        Ok(outcome)
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get job")?;
        Ok(row.map(|r| Self::job_from_row(&r)))
    }

    async fn get_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut sql = String::from("SELECT * FROM jobs WHERE 1=1");
        if filter.active_only {
            sql.push_str(" AND is_active = 1");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.source.is_some() {
            sql.push_str(" AND source = ?");
        }
        if filter.no_phone_only {
            sql.push_str(" AND is_no_phone = 1");
        }
        if filter.has_salary {
            sql.push_str(" AND salary_min IS NOT NULL");
        }
        sql.push_str(" ORDER BY scraped_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql);
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        if let Some(source) = &filter.source {
            query = query.bind(source.clone());
        }
        query = query.bind(filter.limit).bind(filter.offset);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list jobs")?;
        Ok(rows.iter().map(Self::job_from_row).collect())
    }

    async fn search_jobs(&self, query: &str, limit: i64) -> Result<Vec<Job>> {
        let pattern = format!("%{}%", query.trim());
        let rows = sqlx::query(
            r#"
            SELECT * FROM jobs
            WHERE is_active = 1
              AND (title LIKE ? OR description LIKE ? OR company LIKE ?)
            ORDER BY scraped_at DESC
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search jobs")?;
        Ok(rows.iter().map(Self::job_from_row).collect())
    }

    async fn get_stats(&self) -> Result<JobStats> {
        let mut stats = JobStats::default();

        stats.total_jobs =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count jobs")?;
        stats.no_phone_jobs = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE is_active = 1 AND is_no_phone = 1",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count no-phone jobs")?;
        stats.with_salary = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE is_active = 1 AND salary_min IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count salaried jobs")?;

        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS count FROM jobs WHERE is_active = 1 GROUP BY source",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count jobs by source")?;
        for row in &rows {
            stats
                .by_source
                .insert(row.get("source"), row.get("count"));
        }

        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS count FROM jobs WHERE is_active = 1 GROUP BY category",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to count jobs by category")?;
        for row in &rows {
            stats
                .by_category
                .insert(row.get("category"), row.get("count"));
        }

        let rows = sqlx::query(
            "SELECT source, MAX(scraped_at) AS last_scrape FROM jobs GROUP BY source",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read last scrape times")?;
        for row in &rows {
            let last: Option<DateTime<Utc>> = row.get("last_scrape");
            if let Some(last) = last {
                stats.last_scrape.insert(row.get("source"), last);
            }
        }

        Ok(stats)
    }

    async fn start_run(&self, source: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO scrape_runs (source, started_at, status) VALUES (?, ?, ?)",
        )
        .bind(source)
        .bind(Utc::now())
        .bind(ScrapeStatus::Running.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to record run start")?;
        Ok(result.last_insert_rowid())
    }

    async fn finish_run(
        &self,
        run_id: i64,
        found: i64,
        new: i64,
        updated: i64,
        status: ScrapeStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE scrape_runs SET
                finished_at = ?, jobs_found = ?, jobs_new = ?, jobs_updated = ?,
                status = ?, error = ?
            WHERE id = ? AND status = 'running'
            "#,
        )
        .bind(Utc::now())
        .bind(found)
        .bind(new)
        .bind(updated)
        .bind(status.as_str())
        .bind(error)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .context("Failed to finalize run")?;

        if result.rows_affected() == 0 {
            warn!(run_id, "run already finalized or unknown");
        }
        Ok(())
    }

    async fn list_runs(&self, limit: i64) -> Result<Vec<ScrapeRun>> {
        let rows = sqlx::query("SELECT * FROM scrape_runs ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list runs")?;
        Ok(rows.iter().map(Self::run_from_row).collect())
    }
}
