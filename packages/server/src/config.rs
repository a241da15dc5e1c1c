use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::Path;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Token guarding the scrape-trigger endpoint.
    pub scrape_token: String,
    /// Six-field cron expression for the periodic ingestion run.
    pub scrape_schedule: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/jobs.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            scrape_token: env::var("SCRAPE_TOKEN")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            scrape_schedule: env::var("SCRAPE_SCHEDULE")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
        })
    }

    /// Filesystem path of the SQLite database, when the url points at a
    /// file rather than an in-memory database.
    pub fn database_path(&self) -> Option<&Path> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        if path.is_empty() || path.starts_with(':') {
            return None;
        }
        Some(Path::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_extraction() {
        let config = Config {
            database_url: "sqlite://data/jobs.db".to_string(),
            port: 8000,
            scrape_token: String::new(),
            scrape_schedule: String::new(),
        };
        assert_eq!(config.database_path(), Some(Path::new("data/jobs.db")));

        let memory = Config {
            database_url: "sqlite::memory:".to_string(),
            ..config
        };
        assert_eq!(memory.database_path(), None);
    }
}
