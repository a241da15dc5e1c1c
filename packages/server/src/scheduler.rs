//! Scheduled background ingestion using tokio-cron-scheduler.
//!
//! The server process runs the same orchestrator the CLI uses, on a cron
//! schedule, so stored postings stay fresh without an external trigger.

use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use job_scraper::runner::ScrapeRunner;

/// Start the periodic ingestion schedule.
pub async fn start_scheduler(
    runner: Arc<ScrapeRunner>,
    schedule: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job_runner = runner.clone();
    let scrape_job = Job::new_async(schedule, move |_uuid, _lock| {
        let runner = job_runner.clone();
        Box::pin(async move {
            tracing::info!("Running scheduled scrape");
            let report = runner.run_all().await;
            let totals = report.totals();
            tracing::info!(
                found = totals.found,
                new = totals.new,
                updated = totals.updated,
                "Scheduled scrape finished"
            );
        })
    })?;

    scheduler.add(scrape_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Scheduled ingestion started");
    Ok(scheduler)
}
