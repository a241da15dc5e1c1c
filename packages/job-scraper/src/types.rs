use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownCategory;
use crate::salary::SalaryUnit;

/// Stable identity of a job posting, derived from `(source, source_id)`.
///
/// The id is a truncated SHA-256 digest, so re-observing the same posting
/// maps to the same stored record no matter how its other fields changed.
/// The hash is used for collision resistance only, not for any security
/// property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Digest length in hex characters.
    const HEX_LEN: usize = 16;

    /// Derive the identity for a posting. Pure: never involves mutable
    /// fields such as title or salary.
    pub fn derive(source: &str, source_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(b":");
        hasher.update(source_id.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..Self::HEX_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of job categories assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Support,
    Moderation,
    DataEntry,
    Va,
    Dev,
    Design,
    Marketing,
    Sales,
    Writing,
    Hr,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Support => "support",
            Category::Moderation => "moderation",
            Category::DataEntry => "data-entry",
            Category::Va => "va",
            Category::Dev => "dev",
            Category::Design => "design",
            Category::Marketing => "marketing",
            Category::Sales => "sales",
            Category::Writing => "writing",
            Category::Hr => "hr",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "support" => Ok(Category::Support),
            "moderation" => Ok(Category::Moderation),
            "data-entry" => Ok(Category::DataEntry),
            "va" => Ok(Category::Va),
            "dev" => Ok(Category::Dev),
            "design" => Ok(Category::Design),
            "marketing" => Ok(Category::Marketing),
            "sales" => Ok(Category::Sales),
            "writing" => Ok(Category::Writing),
            "hr" => Ok(Category::Hr),
            "other" => Ok(Category::Other),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Unvalidated posting data as produced by a source, prior to
/// canonicalization. Sources must fill `source`, `source_id`, `title`
/// and `url`; everything else is best effort.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub source: &'static str,
    pub source_id: String,
    pub title: String,
    pub company: String,
    pub company_logo: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Structured salary hints, for sources that report numbers directly.
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// Free-text salary hint, for sources that only expose display text.
    pub salary_text: Option<String>,
    pub salary_unit: SalaryUnit,
    pub url: String,
    pub apply_url: Option<String>,
    pub tags: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// The canonical, classified job record the pipeline persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub company: String,
    pub company_logo: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Annualized bounds; both present or both absent, min <= max.
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: String,
    pub url: String,
    pub apply_url: Option<String>,
    pub tags: Vec<String>,
    pub category: Category,
    pub is_no_phone: bool,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Lifecycle of a recorded scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Running,
    Success,
    Error,
}

impl ScrapeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Running => "running",
            ScrapeStatus::Success => "success",
            ScrapeStatus::Error => "error",
        }
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ScrapeStatus::Running),
            "success" => Ok(ScrapeStatus::Success),
            "error" => Ok(ScrapeStatus::Error),
            other => Err(format!("unknown scrape status: {}", other)),
        }
    }
}

/// One recorded ingestion run for a single source.
///
/// Created `running` when the run starts and finalized exactly once when it
/// ends, on both the success and the failure path.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeRun {
    pub id: i64,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs_found: i64,
    pub jobs_new: i64,
    pub jobs_updated: i64,
    pub status: ScrapeStatus,
    pub error: Option<String>,
}
