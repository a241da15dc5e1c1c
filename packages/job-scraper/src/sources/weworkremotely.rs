//! We Work Remotely source, parsed from the public HTML listings.

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
use crate::sources::{http_client, JobSource};
use crate::types::RawJob;

const SOURCE: &str = "weworkremotely";
const BASE_URL: &str = "https://weworkremotely.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; remote-job-aggregator/0.1)";

/// Listing pages scraped, no-phone friendly category first. The main
/// listing overlaps the category pages, hence the URL de-duplication below.
const CATEGORY_PATHS: &[&str] = &[
    "/categories/remote-customer-support-jobs",
    "/remote-jobs",
];

lazy_static! {
    static ref SALARY_RANGE_RE: Regex =
        Regex::new(r"\$[\d,]+\s*[-\u{2013}]\s*\$[\d,]+").unwrap();
}

pub struct WeWorkRemotelySource {
    client: reqwest::Client,
    fetch_delay: Duration,
}

impl WeWorkRemotelySource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http_client(config, USER_AGENT)?,
            fetch_delay: config.fetch_delay,
        })
    }
}

#[async_trait]
impl JobSource for WeWorkRemotelySource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();
        let mut seen_urls = HashSet::new();

        for (index, path) in CATEGORY_PATHS.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.fetch_delay).await;
            }
            let url = format!("{}{}", BASE_URL, path);
            let response = match self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
            {
                Ok(response) => response,
                Err(err) => {
                    warn!(source = SOURCE, url = %url, error = %err, "category fetch failed");
                    continue;
                }
            };
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(source = SOURCE, url = %url, error = %err, "category body read failed");
                    continue;
                }
            };

            for raw in parse_listing(&body) {
                if seen_urls.insert(raw.url.clone()) {
                    jobs.push(raw);
                }
            }
        }

        Ok(jobs)
    }
}

fn parse_listing(html: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let mut jobs = Vec::new();

    let items = match Selector::parse("li") {
        Ok(selector) => selector,
        Err(_) => return jobs,
    };
    for item in document.select(&items) {
        if let Some(raw) = parse_item(&item) {
            jobs.push(raw);
        }
    }
    jobs
}

fn parse_item(item: &ElementRef<'_>) -> Option<RawJob> {
    let link_selector = Selector::parse(r#"a[href*="/remote-jobs/"]"#).ok()?;
    let link = item.select(&link_selector).next()?;
    let href = link.value().attr("href")?;

    let url = Url::parse(BASE_URL).ok()?.join(href).ok()?.to_string();
    let source_id = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())?
        .to_string();

    let title = select_text(item, ".title").or_else(|| {
        let text = link.text().collect::<String>().trim().to_string();
        (!text.is_empty()).then_some(text)
    })?;

    let company = select_text(item, ".company").unwrap_or_else(|| "Unknown".to_string());
    let company_logo = select_attr(item, "img.logo, div.logo img", "src");
    let location = select_text(item, ".region").or_else(|| Some("Remote".to_string()));
    let salary_text = extract_salary_text(item);

    let mut tags = Vec::new();
    if let Ok(tag_selector) = Selector::parse(".tag, .label") {
        for tag in item.select(&tag_selector) {
            let text = tag.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                tags.push(text);
            }
        }
    }

    Some(RawJob {
        source: SOURCE,
        source_id,
        title,
        company,
        company_logo,
        location,
        salary_text,
        url,
        tags,
        ..Default::default()
    })
}

/// Salary display text, from the dedicated elements first, otherwise a
/// `$x - $y` span anywhere in the listing text.
fn extract_salary_text(item: &ElementRef<'_>) -> Option<String> {
    for selector in [".salary", ".compensation", r#"span[class*="salary"]"#] {
        if let Some(text) = select_text(item, selector) {
            return Some(text);
        }
    }
    let full_text = item.text().collect::<Vec<_>>().join(" ");
    SALARY_RANGE_RE
        .find(&full_text)
        .map(|m| m.as_str().to_string())
}

fn select_text(item: &ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = item.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn select_attr(item: &ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    item.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.to_string())
}
