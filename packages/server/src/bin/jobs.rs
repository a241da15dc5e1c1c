//! Operational CLI: run scrapes and inspect the job store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use job_scraper::config::ScraperConfig;
use job_scraper::runner::{ScrapeRunner, SourceOutcome};
use job_scraper::sources::default_sources;
use job_scraper::storage::{JobFilter, JobStore, SqliteJobStore};
use job_scraper::types::{Category, Job};

#[derive(Parser)]
#[command(name = "jobs", about = "Aggregate and inspect remote job postings")]
struct Cli {
    /// Database url
    #[arg(long, global = true, default_value = "sqlite://data/jobs.db")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run ingestion for all sources, or a single one
    Scrape {
        /// Only scrape this source
        #[arg(short, long)]
        source: Option<String>,
    },
    /// List stored jobs
    List {
        /// Filter by category (support, dev, design, ...)
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by source
        #[arg(short, long)]
        source: Option<String>,
        /// Only jobs that don't require a phone
        #[arg(long)]
        no_phone: bool,
        /// Only jobs with salary information
        #[arg(long)]
        has_salary: bool,
        /// Number of results
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Search jobs by keyword
    Search {
        query: String,
        /// Number of results
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Show aggregate statistics
    Stats,
    /// Export jobs to a JSON file
    Export {
        /// Output file
        #[arg(short, long, default_value = "data/export.json")]
        output: PathBuf,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Only jobs that don't require a phone
        #[arg(long)]
        no_phone: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli
        .db
        .strip_prefix("sqlite://")
        .map(std::path::Path::new)
    {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).context("Failed to create database directory")?;
            }
        }
    }

    let store = Arc::new(
        SqliteJobStore::connect(&cli.db)
            .await
            .context("Failed to open job store")?,
    );

    match cli.command {
        Command::Scrape { source } => scrape(store, source).await,
        Command::List {
            category,
            source,
            no_phone,
            has_salary,
            limit,
        } => list(store, category, source, no_phone, has_salary, limit).await,
        Command::Search { query, limit } => search(store, &query, limit).await,
        Command::Stats => stats(store).await,
        Command::Export {
            output,
            category,
            no_phone,
        } => export(store, output, category, no_phone).await,
    }
}

async fn scrape(store: Arc<SqliteJobStore>, source: Option<String>) -> Result<()> {
    let config = ScraperConfig::default();
    let sources = default_sources(&config).context("Failed to build sources")?;
    let runner = ScrapeRunner::new(store, sources);

    let reports = match source {
        Some(name) => vec![runner.run_source(&name).await?],
        None => runner.run_all().await.sources,
    };

    let mut total_found = 0;
    let mut total_new = 0;
    let mut total_updated = 0;

    for report in &reports {
        match &report.outcome {
            SourceOutcome::Completed(counts) => {
                println!(
                    "{} {}  found {}, new {}, updated {}",
                    "✓".green(),
                    report.source.bold(),
                    counts.found,
                    counts.new,
                    counts.updated
                );
                total_found += counts.found;
                total_new += counts.new;
                total_updated += counts.updated;
            }
            SourceOutcome::Failed { error } => {
                println!("{} {}  {}", "✗".red(), report.source.bold(), error.red());
            }
        }
    }

    println!(
        "\n{} {} jobs, {} new, {} updated",
        "Done!".green().bold(),
        total_found,
        total_new,
        total_updated
    );
    Ok(())
}

async fn list(
    store: Arc<SqliteJobStore>,
    category: Option<String>,
    source: Option<String>,
    no_phone: bool,
    has_salary: bool,
    limit: i64,
) -> Result<()> {
    let category = parse_category(category)?;
    let jobs = store
        .get_jobs(&JobFilter {
            category,
            source,
            no_phone_only: no_phone,
            has_salary,
            limit,
            ..JobFilter::default()
        })
        .await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found matching criteria.".yellow());
        return Ok(());
    }

    println!("{}", format!("Remote Jobs ({} results)", jobs.len()).bold());
    for job in &jobs {
        print_job_line(job);
    }
    Ok(())
}

async fn search(store: Arc<SqliteJobStore>, query: &str, limit: i64) -> Result<()> {
    let jobs = store.search_jobs(query, limit).await?;

    if jobs.is_empty() {
        println!("{}", format!("No jobs found for '{}'", query).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Search results for '{}' ({} found):", query, jobs.len()).bold()
    );
    for job in &jobs {
        println!("{} at {}", job.title.cyan(), job.company.green());
        println!("  Category: {} | Source: {}", job.category, job.source);
        println!("  URL: {}\n", job.url);
    }
    Ok(())
}

async fn stats(store: Arc<SqliteJobStore>) -> Result<()> {
    let stats = store.get_stats().await?;

    println!("{}\n", "Database Statistics".bold());
    println!("Total active jobs: {}", stats.total_jobs.to_string().green().bold());
    println!("No-phone jobs: {}", stats.no_phone_jobs.to_string().blue().bold());
    println!("Jobs with salary: {}", stats.with_salary.to_string().yellow().bold());

    println!("\n{}", "By Source:".bold());
    for (source, count) in &stats.by_source {
        println!("  {}: {}", source, count);
    }

    println!("\n{}", "By Category:".bold());
    for (category, count) in &stats.by_category {
        println!("  {}: {}", category, count);
    }

    println!("\n{}", "Last Scrape:".bold());
    for (source, last) in &stats.last_scrape {
        println!("  {}: {}", source, last.to_rfc3339());
    }
    Ok(())
}

async fn export(
    store: Arc<SqliteJobStore>,
    output: PathBuf,
    category: Option<String>,
    no_phone: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let jobs = store
        .get_jobs(&JobFilter {
            category,
            no_phone_only: no_phone,
            limit: 10_000,
            ..JobFilter::default()
        })
        .await?;

    if let Some(dir) = output.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).context("Failed to create output directory")?;
        }
    }
    let json = serde_json::to_string_pretty(&jobs)?;
    std::fs::write(&output, json).context("Failed to write export file")?;

    println!(
        "{} Exported {} jobs to {}",
        "✓".green(),
        jobs.len(),
        output.display()
    );
    Ok(())
}

fn parse_category(category: Option<String>) -> Result<Option<Category>> {
    Ok(match category {
        Some(raw) => Some(raw.parse()?),
        None => None,
    })
}

fn print_job_line(job: &Job) {
    let salary = match (job.salary_min, job.salary_max) {
        (Some(min), Some(max)) if min != max => format!("${} - ${}", min, max),
        (Some(min), _) => format!("${}", min),
        _ => String::new(),
    };
    let no_phone = if job.is_no_phone { "✓" } else { " " };

    println!(
        "  {:<45} {:<20} {:<10} {:<18} {} {}",
        truncate(&job.title, 44).cyan(),
        truncate(&job.company, 19).green(),
        job.category.to_string().magenta(),
        salary.yellow(),
        no_phone.blue(),
        job.source
    );
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
