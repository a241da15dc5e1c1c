//! Indeed source: remote-search result pages.
//!
//! Indeed mixes server-rendered result cards with embedded JSON-LD
//! `JobPosting` objects; both are parsed. The site is aggressive about
//! scraping, so searches run with a browser-like client and a conservative
//! delay.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::warn;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::pipeline;
use crate::sources::{http_client, synthetic_id, JobSource};
use crate::types::RawJob;

const SOURCE: &str = "indeed";
const BASE_URL: &str = "https://www.indeed.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Indeed's "remote" location facet.
const REMOTE_FILTER: &str = "032b3046-06a3-4876-8dfd-474eb5e7ed11";
const RESULTS_PER_PAGE: usize = 10;

/// Search queries, no-phone friendly roles first.
const SEARCH_QUERIES: &[&str] = &[
    "remote customer support",
    "remote chat support",
    "remote data entry",
    "remote content moderator",
    "remote virtual assistant",
];

const DESCRIPTION_LIMIT: usize = 2_000;

lazy_static! {
    static ref JK_RE: Regex = Regex::new(r"jk=([a-f0-9]+)").unwrap();
}

pub struct IndeedSource {
    client: reqwest::Client,
    fetch_delay: Duration,
    pages_per_search: usize,
}

impl IndeedSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http_client(config, USER_AGENT)?,
            // Twice the usual delay; Indeed rate-limits hard.
            fetch_delay: config.fetch_delay * 2,
            pages_per_search: config.indeed_pages_per_search,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();

        for page in 0..self.pages_per_search {
            let start = (page * RESULTS_PER_PAGE).to_string();
            let response = self
                .client
                .get(format!("{}/jobs", BASE_URL))
                .query(&[
                    ("q", query),
                    ("l", ""),
                    ("remotejob", REMOTE_FILTER),
                    ("fromage", "14"),
                    ("start", start.as_str()),
                ])
                .send()
                .await?;
            if !response.status().is_success() {
                break;
            }
            let body = response.text().await?;

            let page_jobs = parse_search_results(&body);
            let last_page = page_jobs.len() < RESULTS_PER_PAGE;
            jobs.extend(page_jobs);
            if last_page {
                break;
            }
        }

        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for IndeedSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();
        let mut seen_ids = std::collections::HashSet::new();

        for (index, query) in SEARCH_QUERIES.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.fetch_delay).await;
            }
            match self.search(query).await {
                Ok(found) => {
                    for raw in found {
                        if seen_ids.insert(raw.source_id.clone()) {
                            jobs.push(raw);
                        }
                    }
                }
                Err(err) => {
                    warn!(source = SOURCE, query = query, error = %err, "search failed");
                }
            }
        }

        Ok(jobs)
    }
}

fn parse_search_results(html: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let mut jobs = Vec::new();

    if let Ok(card_selector) =
        Selector::parse("div.job_seen_beacon, div.jobsearch-ResultsList > div, .resultContent")
    {
        for card in document.select(&card_selector) {
            if let Some(raw) = parse_card(&card) {
                jobs.push(raw);
            }
        }
    }

    // Structured data is often more complete than the cards.
    if let Ok(script_selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for script in document.select(&script_selector) {
            let text = script.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                jobs.extend(parse_json_ld(&value));
            }
        }
    }

    jobs
}

fn parse_card(card: &ElementRef<'_>) -> Option<RawJob> {
    let link_selector = Selector::parse("a[data-jk], a.jcs-JobTitle, h2 a").ok()?;
    let link = card.select(&link_selector).next()?;

    let source_id = link
        .value()
        .attr("data-jk")
        .map(|v| v.to_string())
        .or_else(|| {
            link.value()
                .attr("href")
                .and_then(|href| JK_RE.captures(href))
                .map(|cap| cap[1].to_string())
        })?;

    let title = select_text(card, "h2.jobTitle span, .jobTitle, a.jcs-JobTitle span")
        .or_else(|| {
            let text = link.text().collect::<String>().trim().to_string();
            (!text.is_empty()).then_some(text)
        })?;

    let company = select_text(
        card,
        r#"span.companyName, .company, [data-testid="company-name"]"#,
    )
    .unwrap_or_else(|| "Unknown".to_string());
    let location = select_text(
        card,
        r#"div.companyLocation, .location, [data-testid="text-location"]"#,
    )
    .or_else(|| Some("Remote".to_string()));
    let salary_text = select_text(
        card,
        r#".salary-snippet, .salaryText, [data-testid="attribute_snippet_testid"]"#,
    );
    let description = select_text(card, ".job-snippet, .summary");

    Some(RawJob {
        source: SOURCE,
        source_id: source_id.clone(),
        title,
        company,
        description,
        location,
        salary_text,
        url: format!("{}/viewjob?jk={}", BASE_URL, source_id),
        tags: vec!["remote".to_string()],
        ..Default::default()
    })
}

/// Parse `JobPosting` objects out of a JSON-LD payload (single object or
/// array).
fn parse_json_ld(value: &serde_json::Value) -> Vec<RawJob> {
    match value {
        serde_json::Value::Array(items) => {
            items.iter().filter_map(parse_json_ld_posting).collect()
        }
        _ => parse_json_ld_posting(value).into_iter().collect(),
    }
}

fn parse_json_ld_posting(value: &serde_json::Value) -> Option<RawJob> {
    if value.get("@type").and_then(|t| t.as_str()) != Some("JobPosting") {
        return None;
    }

    let title = value.get("title")?.as_str()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let company = value
        .get("hiringOrganization")
        .and_then(|org| org.get("name"))
        .and_then(|name| name.as_str())
        .unwrap_or("Unknown")
        .to_string();

    let description = value
        .get("description")
        .and_then(|d| d.as_str())
        .map(pipeline::clean_html)
        .map(|d| pipeline::truncate_chars(&d, DESCRIPTION_LIMIT))
        .filter(|d| !d.is_empty());

    let location = value
        .get("jobLocation")
        .and_then(|loc| loc.get("address"))
        .and_then(|address| {
            address
                .get("addressLocality")
                .or_else(|| address.get("addressRegion"))
        })
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Remote")
        .to_string();

    let salary_value = value.get("baseSalary").and_then(|s| s.get("value"));
    let salary_min = salary_value
        .and_then(|v| v.get("minValue"))
        .and_then(|v| v.as_f64());
    let salary_max = salary_value
        .and_then(|v| v.get("maxValue"))
        .and_then(|v| v.as_f64());

    let url = value
        .get("url")
        .and_then(|u| u.as_str())
        .unwrap_or("")
        .to_string();
    let source_id = JK_RE
        .captures(&url)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| synthetic_id(&[&title, &company]));
    let url = if url.is_empty() {
        format!("{}/jobs", BASE_URL)
    } else {
        url
    };

    Some(RawJob {
        source: SOURCE,
        source_id,
        title,
        company,
        description,
        location: Some(location),
        salary_min,
        salary_max,
        url,
        tags: vec!["remote".to_string()],
        ..Default::default()
    })
}

fn select_text(card: &ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = card.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}
