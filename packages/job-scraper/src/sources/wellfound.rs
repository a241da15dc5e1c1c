//! Wellfound (formerly AngelList Talent) source: startup job cards per
//! role category.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::sources::{http_client, synthetic_id, JobSource};
use crate::types::RawJob;

const SOURCE: &str = "wellfound";
const BASE_URL: &str = "https://wellfound.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Role categories scraped, remote-filtered.
const ROLE_CATEGORIES: &[&str] = &[
    "customer-success",
    "operations",
    "marketing",
    "engineering",
    "design",
    "sales",
    "data-science",
    "product",
];

lazy_static! {
    static ref JOB_PATH_RE: Regex = Regex::new(r"/jobs/(\d+)").unwrap();
}

pub struct WellfoundSource {
    client: reqwest::Client,
    fetch_delay: Duration,
}

impl WellfoundSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http_client(config, USER_AGENT)?,
            fetch_delay: config.fetch_delay,
        })
    }
}

#[async_trait]
impl JobSource for WellfoundSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();
        let mut seen_ids = HashSet::new();

        for (index, category) in ROLE_CATEGORIES.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.fetch_delay).await;
            }
            let url = format!("{}/role/r/{}?remote=true", BASE_URL, category);
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(err) => {
                    warn!(source = SOURCE, category = category, error = %err, "category fetch failed");
                    continue;
                }
            };
            if !response.status().is_success() {
                continue;
            }
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(source = SOURCE, category = category, error = %err, "category body read failed");
                    continue;
                }
            };

            for raw in parse_listing(&body, category) {
                if seen_ids.insert(raw.source_id.clone()) {
                    jobs.push(raw);
                }
            }
        }

        Ok(jobs)
    }
}

fn parse_listing(html: &str, category: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let mut jobs = Vec::new();

    let cards = match Selector::parse(
        r#"[data-test="StartupResult"], .job-listing, article"#,
    ) {
        Ok(selector) => selector,
        Err(_) => return jobs,
    };
    for card in document.select(&cards) {
        if let Some(raw) = parse_card(&card, category) {
            jobs.push(raw);
        }
    }
    jobs
}

fn parse_card(card: &ElementRef<'_>, category: &str) -> Option<RawJob> {
    let title = select_text(card, r#"h2, [data-test="StartupResult-name"]"#)?;
    if title.len() < 3 {
        return None;
    }

    let company = select_text(card, r#"[data-test="startup-name"], .company-name"#)
        .unwrap_or_else(|| "Startup".to_string());

    let mut url = String::new();
    let mut source_id = String::new();
    if let Ok(link_selector) =
        Selector::parse(r#"a[href*="/jobs/"], a[href*="/company/"]"#)
    {
        if let Some(link) = card.select(&link_selector).next() {
            if let Some(href) = link.value().attr("href") {
                url = Url::parse(BASE_URL)
                    .ok()
                    .and_then(|base| base.join(href).ok())
                    .map(|joined| joined.to_string())
                    .unwrap_or_default();
                if let Some(cap) = JOB_PATH_RE.captures(href) {
                    source_id = cap[1].to_string();
                }
            }
        }
    }
    if source_id.is_empty() {
        source_id = synthetic_id(&[&title, &company]);
    }
    if url.is_empty() {
        return None;
    }

    let salary_text = select_text(card, ".salary, .compensation");
    let location =
        select_text(card, ".location").or_else(|| Some("Remote".to_string()));

    Some(RawJob {
        source: SOURCE,
        source_id,
        title,
        company,
        location,
        salary_text,
        url,
        tags: vec![
            "startup".to_string(),
            "remote".to_string(),
            category.to_string(),
        ],
        ..Default::default()
    })
}

fn select_text(card: &ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = card.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}
