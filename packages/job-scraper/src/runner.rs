//! Ingestion orchestrator: drives one run across the configured sources.
//!
//! Sources are processed sequentially, in a fixed order, because several of
//! them rate-limit themselves against external services. One source's total
//! failure never aborts the run for the others; its run record is finalized
//! as an error and the orchestrator advances.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ScrapeError;
use crate::pipeline;
use crate::sources::JobSource;
use crate::storage::JobStore;
use crate::types::{JobId, ScrapeStatus};

/// Per-source counters accumulated during ingestion.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunCounts {
    pub found: i64,
    pub new: i64,
    pub updated: i64,
}

/// How one source's run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceOutcome {
    Completed(RunCounts),
    Failed { error: String },
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Completed(_))
    }
}

/// Outcome of one source within a run report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Per-source outcomes of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn totals(&self) -> RunCounts {
        let mut totals = RunCounts::default();
        for report in &self.sources {
            if let SourceOutcome::Completed(counts) = &report.outcome {
                totals.found += counts.found;
                totals.new += counts.new;
                totals.updated += counts.updated;
            }
        }
        totals
    }
}

/// Drives ingestion runs against a store.
pub struct ScrapeRunner {
    store: Arc<dyn JobStore>,
    sources: Vec<Arc<dyn JobSource>>,
}

impl ScrapeRunner {
    pub fn new(store: Arc<dyn JobStore>, sources: Vec<Arc<dyn JobSource>>) -> Self {
        Self { store, sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run ingestion for every configured source, in order.
    pub async fn run_all(&self) -> RunReport {
        let mut reports = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            reports.push(self.run_one(source.as_ref()).await);
        }
        let report = RunReport { sources: reports };
        let totals = report.totals();
        info!(
            found = totals.found,
            new = totals.new,
            updated = totals.updated,
            "Scrape run complete"
        );
        report
    }

    /// Run ingestion for a single source by name.
    pub async fn run_source(&self, name: &str) -> Result<SourceReport, ScrapeError> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ScrapeError::UnknownSource(name.to_string()))?;
        Ok(self.run_one(source.as_ref()).await)
    }

    /// One source's full lifecycle: start the run record, ingest, finalize.
    ///
    /// The run record is finalized on every path so nothing is left
    /// `running`.
    async fn run_one(&self, source: &dyn JobSource) -> SourceReport {
        let name = source.name();
        info!(source = name, "Starting scrape");

        let run_id = match self.store.start_run(name).await {
            Ok(id) => id,
            Err(err) => {
                error!(source = name, error = %err, "Failed to record run start");
                return SourceReport {
                    source: name.to_string(),
                    outcome: SourceOutcome::Failed {
                        error: err.to_string(),
                    },
                };
            }
        };

        match self.ingest(source).await {
            Ok(counts) => {
                if let Err(err) = self
                    .store
                    .finish_run(
                        run_id,
                        counts.found,
                        counts.new,
                        counts.updated,
                        ScrapeStatus::Success,
                        None,
                    )
                    .await
                {
                    error!(source = name, run_id, error = %err, "Failed to finalize run");
                    return SourceReport {
                        source: name.to_string(),
                        outcome: SourceOutcome::Failed {
                            error: err.to_string(),
                        },
                    };
                }
                info!(
                    source = name,
                    found = counts.found,
                    new = counts.new,
                    updated = counts.updated,
                    "Scrape succeeded"
                );
                SourceReport {
                    source: name.to_string(),
                    outcome: SourceOutcome::Completed(counts),
                }
            }
            Err(err) => {
                let message = err.to_string();
                warn!(source = name, error = %message, "Scrape failed");
                if let Err(finish_err) = self
                    .store
                    .finish_run(run_id, 0, 0, 0, ScrapeStatus::Error, Some(&message))
                    .await
                {
                    error!(
                        source = name,
                        run_id,
                        error = %finish_err,
                        "Failed to finalize run after error"
                    );
                }
                SourceReport {
                    source: name.to_string(),
                    outcome: SourceOutcome::Failed { error: message },
                }
            }
        }
    }

    /// Fetch, canonicalize, and upsert every record for one source.
    async fn ingest(&self, source: &dyn JobSource) -> Result<RunCounts, ScrapeError> {
        let raw_jobs = source.fetch().await?;

        let mut counts = RunCounts::default();
        // Overlapping result pages can repeat a posting within one fetch;
        // each (source, source_id) is processed at most once per run.
        let mut seen: HashSet<JobId> = HashSet::new();

        for raw in raw_jobs {
            let id = JobId::derive(raw.source, &raw.source_id);
            if !seen.insert(id) {
                continue;
            }
            let job = match pipeline::canonicalize(raw) {
                Some(job) => job,
                None => continue,
            };
            let outcome = self.store.upsert_job(&job).await?;
            counts.found += 1;
            if outcome.is_new {
                counts.new += 1;
            } else if outcome.is_updated {
                counts.updated += 1;
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::storage::{JobFilter, JobStats, UpsertOutcome};
    use crate::types::{Job, RawJob, ScrapeRun};

    struct MockSource {
        name: &'static str,
        jobs: Vec<RawJob>,
        fail: bool,
    }

    impl MockSource {
        fn ok(name: &'static str, jobs: Vec<RawJob>) -> Arc<dyn JobSource> {
            Arc::new(Self {
                name,
                jobs,
                fail: false,
            })
        }

        fn failing(name: &'static str) -> Arc<dyn JobSource> {
            Arc::new(Self {
                name,
                jobs: Vec::new(),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl JobSource for MockSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
            if self.fail {
                return Err(ScrapeError::Payload {
                    url: format!("https://{}.example.com", self.name),
                    message: "boom".to_string(),
                });
            }
            Ok(self.jobs.clone())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        jobs: Mutex<HashMap<JobId, Job>>,
        runs: Mutex<Vec<ScrapeRun>>,
    }

    #[async_trait]
    impl JobStore for MemoryStore {
        async fn upsert_job(&self, job: &Job) -> Result<UpsertOutcome> {
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get(&job.id) {
                Some(existing) => {
                    let changed = existing.title != job.title
                        || existing.salary_min != job.salary_min
                        || existing.salary_max != job.salary_max;
                    jobs.insert(job.id.clone(), job.clone());
                    Ok(UpsertOutcome {
                        is_new: false,
                        is_updated: changed,
                    })
                }
                None => {
                    jobs.insert(job.id.clone(), job.clone());
                    Ok(UpsertOutcome {
                        is_new: true,
                        is_updated: false,
                    })
                }
            }
        }

        async fn get_job(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn get_jobs(&self, _filter: &JobFilter) -> Result<Vec<Job>> {
            unimplemented!()
        }

        async fn search_jobs(&self, _query: &str, _limit: i64) -> Result<Vec<Job>> {
            unimplemented!()
        }

        async fn get_stats(&self) -> Result<JobStats> {
            unimplemented!()
        }

        async fn start_run(&self, source: &str) -> Result<i64> {
            let mut runs = self.runs.lock().unwrap();
            let id = runs.len() as i64 + 1;
            runs.push(ScrapeRun {
                id,
                source: source.to_string(),
                started_at: chrono::Utc::now(),
                finished_at: None,
                jobs_found: 0,
                jobs_new: 0,
                jobs_updated: 0,
                status: ScrapeStatus::Running,
                error: None,
            });
            Ok(id)
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
            let mut runs = self.runs.lock().unwrap();
            let run = runs
                .iter_mut()
                .find(|r| r.id == run_id && r.status == ScrapeStatus::Running)
                .expect("finalizing unknown or finished run");
            run.finished_at = Some(chrono::Utc::now());
            run.jobs_found = found;
            run.jobs_new = new;
            run.jobs_updated = updated;
            run.status = status;
            run.error = error.map(|e| e.to_string());
            Ok(())
        }

        async fn list_runs(&self, _limit: i64) -> Result<Vec<ScrapeRun>> {
            Ok(self.runs.lock().unwrap().clone())
        }
    }

    fn raw(source: &'static str, source_id: &str, title: &str) -> RawJob {
        RawJob {
            source,
            source_id: source_id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            url: format!("https://{}.example.com/{}", source, source_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn failing_source_does_not_abort_the_run() {
        let store = Arc::new(MemoryStore::default());
        let runner = ScrapeRunner::new(
            store.clone(),
            vec![
                MockSource::ok("alpha", vec![raw("alpha", "1", "Support Agent")]),
                MockSource::failing("bravo"),
                MockSource::ok("charlie", vec![raw("charlie", "1", "Moderator")]),
            ],
        );

        let report = runner.run_all().await;
        assert_eq!(report.sources.len(), 3);
        assert!(report.sources[0].outcome.is_success());
        assert!(!report.sources[1].outcome.is_success());
        assert!(report.sources[2].outcome.is_success());

        let runs = store.list_runs(10).await.unwrap();
        let statuses: Vec<ScrapeStatus> = runs.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ScrapeStatus::Success,
                ScrapeStatus::Error,
                ScrapeStatus::Success
            ]
        );
        let failed = &runs[1];
        assert!(failed.error.as_deref().unwrap_or_default().contains("boom"));
    }

    #[tokio::test]
    async fn every_started_run_is_finalized() {
        let store = Arc::new(MemoryStore::default());
        let runner = ScrapeRunner::new(
            store.clone(),
            vec![
                MockSource::ok("alpha", vec![raw("alpha", "1", "Support Agent")]),
                MockSource::failing("bravo"),
            ],
        );

        runner.run_all().await;

        let runs = store.list_runs(10).await.unwrap();
        assert_eq!(runs.len(), 2);
        for run in &runs {
            assert_ne!(run.status, ScrapeStatus::Running);
            assert!(run.finished_at.is_some());
        }
    }

    #[tokio::test]
    async fn duplicate_records_are_processed_once_per_run() {
        let store = Arc::new(MemoryStore::default());
        let runner = ScrapeRunner::new(
            store.clone(),
            vec![MockSource::ok(
                "alpha",
                vec![
                    raw("alpha", "1", "Support Agent"),
                    raw("alpha", "1", "Support Agent"),
                    raw("alpha", "2", "Moderator"),
                ],
            )],
        );

        let report = runner.run_all().await;
        match &report.sources[0].outcome {
            SourceOutcome::Completed(counts) => {
                assert_eq!(counts.found, 2);
                assert_eq!(counts.new, 2);
                assert_eq!(counts.updated, 0);
            }
            SourceOutcome::Failed { error } => panic!("unexpected failure: {}", error),
        }
    }

    #[tokio::test]
    async fn rejected_records_are_skipped_not_fatal() {
        let store = Arc::new(MemoryStore::default());
        let mut no_title = raw("alpha", "3", "");
        no_title.url = "https://alpha.example.com/3".to_string();
        let runner = ScrapeRunner::new(
            store.clone(),
            vec![MockSource::ok(
                "alpha",
                vec![no_title, raw("alpha", "4", "Data Entry Clerk")],
            )],
        );

        let report = runner.run_all().await;
        match &report.sources[0].outcome {
            SourceOutcome::Completed(counts) => {
                assert_eq!(counts.found, 1);
                assert_eq!(counts.new, 1);
            }
            SourceOutcome::Failed { error } => panic!("unexpected failure: {}", error),
        }
    }

    #[tokio::test]
    async fn rerun_reports_updates_only_on_meaningful_change() {
        let store = Arc::new(MemoryStore::default());

        let first = ScrapeRunner::new(
            store.clone(),
            vec![MockSource::ok("alpha", vec![raw("alpha", "1", "Support Agent")])],
        );
        first.run_all().await;

        // Same record again: neither new nor updated.
        let second = ScrapeRunner::new(
            store.clone(),
            vec![MockSource::ok("alpha", vec![raw("alpha", "1", "Support Agent")])],
        );
        let report = second.run_all().await;
        match &report.sources[0].outcome {
            SourceOutcome::Completed(counts) => {
                assert_eq!(counts.found, 1);
                assert_eq!(counts.new, 0);
                assert_eq!(counts.updated, 0);
            }
            SourceOutcome::Failed { error } => panic!("unexpected failure: {}", error),
        }

        // Title change counts as an update.
        let third = ScrapeRunner::new(
            store.clone(),
            vec![MockSource::ok(
                "alpha",
                vec![raw("alpha", "1", "Senior Support Agent")],
            )],
        );
        let report = third.run_all().await;
        match &report.sources[0].outcome {
            SourceOutcome::Completed(counts) => {
                assert_eq!(counts.updated, 1);
            }
            SourceOutcome::Failed { error } => panic!("unexpected failure: {}", error),
        }
    }

    #[tokio::test]
    async fn unknown_source_is_an_error() {
        let store = Arc::new(MemoryStore::default());
        let runner = ScrapeRunner::new(store, Vec::new());
        let err = runner.run_source("nope").await.unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownSource(_)));
    }

    #[tokio::test]
    async fn run_source_targets_one_source() {
        let store = Arc::new(MemoryStore::default());
        let runner = ScrapeRunner::new(
            store.clone(),
            vec![
                MockSource::ok("alpha", vec![raw("alpha", "1", "Support Agent")]),
                MockSource::ok("bravo", vec![raw("bravo", "1", "Moderator")]),
            ],
        );

        let report = runner.run_source("bravo").await.unwrap();
        assert_eq!(report.source, "bravo");
        let runs = store.list_runs(10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].source, "bravo");
    }
}
