//! RemoteOK source, backed by the public JSON API.
//!
//! API terms require linking back to RemoteOK as the source of the
//! postings. The first element of the response array is a legal notice,
//! not a job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::pipeline;
use crate::salary::SalaryUnit;
use crate::sources::{http_client, JobSource};
use crate::types::RawJob;

const SOURCE: &str = "remoteok";
const BASE_URL: &str = "https://remoteok.com";
const API_URL: &str = "https://remoteok.com/api";
const USER_AGENT: &str = "remote-job-aggregator/0.1 (job aggregation service)";

pub struct RemoteOkSource {
    client: reqwest::Client,
}

impl RemoteOkSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http_client(config, USER_AGENT)?,
        })
    }
}

#[async_trait]
impl JobSource for RemoteOkSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
        let items: Vec<serde_json::Value> = self
            .client
            .get(API_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut jobs = Vec::new();
        // Skip the leading legal/terms notice.
        for item in items.into_iter().skip(1) {
            match serde_json::from_value::<RemoteOkItem>(item) {
                Ok(item) => {
                    if let Some(raw) = parse_item(item) {
                        jobs.push(raw);
                    }
                }
                Err(err) => {
                    debug!(source = SOURCE, error = %err, "skipping malformed item");
                }
            }
        }
        Ok(jobs)
    }
}

#[derive(Debug, Deserialize)]
struct RemoteOkItem {
    id: serde_json::Value,
    position: String,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    company_logo: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    salary_min: Option<f64>,
    #[serde(default)]
    salary_max: Option<f64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    apply_url: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    date: Option<String>,
}

fn parse_item(item: RemoteOkItem) -> Option<RawJob> {
    let source_id = match &item.id {
        serde_json::Value::String(s) if !s.is_empty() => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if item.position.is_empty() {
        return None;
    }

    let url = item
        .url
        .clone()
        .filter(|u| !u.is_empty())
        .or_else(|| {
            item.slug
                .as_ref()
                .map(|slug| format!("{}/remote-jobs/{}", BASE_URL, slug))
        })?;

    let description = item
        .description
        .as_deref()
        .map(pipeline::clean_html)
        .filter(|d| !d.is_empty());

    // The API reports absent salaries as zero; the normalizer's sanity
    // window discards them.
    Some(RawJob {
        source: SOURCE,
        source_id,
        title: item.position,
        company: item.company.unwrap_or_else(|| "Unknown".to_string()),
        company_logo: item.company_logo.or(item.logo),
        description,
        location: item.location.filter(|l| !l.is_empty()).or_else(|| Some("Remote".to_string())),
        salary_min: item.salary_min,
        salary_max: item.salary_max,
        salary_unit: SalaryUnit::Annual,
        url,
        apply_url: item.apply_url,
        tags: item.tags,
        posted_at: item.date.as_deref().and_then(parse_date),
        ..Default::default()
    })
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_regular_item() {
        let item: RemoteOkItem = serde_json::from_value(json!({
            "id": 123456,
            "position": "Customer Support Specialist",
            "company": "Acme",
            "company_logo": "https://remoteok.com/assets/acme.png",
            "description": "<p>Help customers over <b>chat</b>.</p>",
            "location": "Worldwide",
            "salary_min": 40000,
            "salary_max": 60000,
            "url": "https://remoteok.com/remote-jobs/123456",
            "tags": ["support", "chat"],
            "date": "2025-06-01T12:00:00+00:00"
        }))
        .unwrap();

        let raw = parse_item(item).unwrap();
        assert_eq!(raw.source, "remoteok");
        assert_eq!(raw.source_id, "123456");
        assert_eq!(raw.title, "Customer Support Specialist");
        assert_eq!(raw.salary_min, Some(40_000.0));
        assert_eq!(raw.salary_unit, SalaryUnit::Annual);
        assert!(raw.description.unwrap().contains("chat"));
        assert!(raw.posted_at.is_some());
    }

    #[test]
    fn builds_url_from_slug_when_missing() {
        let item: RemoteOkItem = serde_json::from_value(json!({
            "id": "77",
            "position": "Data Entry Clerk",
            "slug": "data-entry-clerk-77"
        }))
        .unwrap();

        let raw = parse_item(item).unwrap();
        assert_eq!(raw.url, "https://remoteok.com/remote-jobs/data-entry-clerk-77");
    }

    #[test]
    fn rejects_items_without_identity_or_title() {
        let no_id: RemoteOkItem = serde_json::from_value(json!({
            "id": null,
            "position": "Ghost Job",
            "url": "https://remoteok.com/x"
        }))
        .unwrap();
        assert!(parse_item(no_id).is_none());
    }

    #[test]
    fn legal_notice_fails_item_deserialization() {
        // The first array element has no id/position fields at all.
        let notice = json!({
            "legal": "API terms: link back to RemoteOK."
        });
        assert!(serde_json::from_value::<RemoteOkItem>(notice).is_err());
    }
}
