//! Reddit source: hiring posts from remote-work subreddits, via the public
//! JSON listings (no authentication).
//!
//! Posts are free text, so this source carries the heaviest extraction
//! front-end: hiring-post filtering, company-name extraction, title
//! cleanup, and salary-span extraction feeding the shared normalizer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tracing::warn;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::pipeline;
use crate::sources::{http_client, JobSource};
use crate::types::RawJob;

const SOURCE: &str = "reddit";
const BASE_URL: &str = "https://www.reddit.com";
const USER_AGENT: &str = "remote-job-aggregator/0.1 (job aggregation service)";

const SUBREDDITS: &[&str] = &["remotejobs", "forhire", "WorkOnline"];
const SORTS: &[&str] = &["hot", "new"];

/// A post must mention at least one of these to count as a hiring post.
const HIRING_KEYWORDS: &[&str] = &[
    "[hiring]",
    "[for hire]",
    "hiring",
    "looking for",
    "we are hiring",
    "job opening",
    "position available",
    "remote position",
    "work from home",
    "$",
    "per hour",
    "/hr",
    "salary",
    "compensation",
];

/// "Looking for work" posts are skipped outright.
const LOOKING_KEYWORDS: &[&str] = &[
    "seeking",
    "looking for work",
    "available for hire",
    "need a job",
    "hire me",
];

const DESCRIPTION_LIMIT: usize = 3_000;
const TITLE_LIMIT: usize = 200;

lazy_static! {
    // [Hiring] Company - Title
    static ref BRACKET_COMPANY_RE: Regex =
        Regex::new(r"(?i)\[hiring\]\s*([^\-\u{2013}|]+?)(?:\s*[\-\u{2013}|]|\s+is\s+hiring)")
            .unwrap();
    // Title at Company
    static ref AT_COMPANY_RE: Regex =
        Regex::new(r"(?:at|@|with)\s+([A-Z][A-Za-z0-9\s&.]+?)(?:\s*[\-\u{2013}|]|\s*$)").unwrap();
    // Company is hiring
    static ref IS_HIRING_RE: Regex =
        Regex::new(r"^([A-Z][A-Za-z0-9\s&.]+?)\s+is\s+hiring").unwrap();
    // Leading [Hiring]/[For Hire]/[Remote] markers
    static ref PREFIX_RE: Regex =
        Regex::new(r"(?i)^\[(?:hiring|for hire|remote)\]\s*").unwrap();
    // Leading "Company -" / "Company |" segment
    static ref LEADING_SEGMENT_RE: Regex =
        Regex::new(r"^[^\-\u{2013}|]+[\-\u{2013}|]\s*").unwrap();
    // Salary fragments inside a title
    static ref TITLE_SALARY_RE: Regex = Regex::new(
        r"(?i)\$[\d,]+(?:\s*[\-\u{2013}]\s*\$[\d,]+)?(?:\s*/\s*(?:hr|hour|year|yr|month|mo))?"
    )
    .unwrap();
    // Salary-looking spans anywhere in title+body, handed to the shared
    // normalizer for conversion and bounds checking.
    static ref SALARY_SPAN_RE: Regex = Regex::new(
        r"(?i)\$\d[\d,.]*(?:\s*[\-\u{2013}]\s*\$?\d[\d,.]*)?(?:\s*/\s*(?:hr|hour|yr|year))?|\b\d+k\s*[\-\u{2013}]\s*\d+k\b"
    )
    .unwrap();
}

pub struct RedditSource {
    client: reqwest::Client,
    fetch_delay: Duration,
}

impl RedditSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: http_client(config, USER_AGENT)?,
            fetch_delay: config.fetch_delay,
        })
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();

        for sort in SORTS {
            let url = format!("{}/r/{}/{}.json", BASE_URL, subreddit, sort);
            let response = self
                .client
                .get(&url)
                .query(&[("limit", "50"), ("t", "week")])
                .send()
                .await?;
            if !response.status().is_success() {
                continue;
            }
            let listing: serde_json::Value = response.json().await?;

            let posts = listing
                .get("data")
                .and_then(|data| data.get("children"))
                .and_then(|children| children.as_array());
            let Some(posts) = posts else { continue };

            for post in posts {
                if let Some(data) = post.get("data") {
                    if let Some(raw) = parse_post(data, subreddit) {
                        jobs.push(raw);
                    }
                }
            }
        }

        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for RedditSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError> {
        let mut jobs = Vec::new();

        for (index, subreddit) in SUBREDDITS.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.fetch_delay).await;
            }
            match self.fetch_subreddit(subreddit).await {
                Ok(subreddit_jobs) => jobs.extend(subreddit_jobs),
                Err(err) => {
                    warn!(source = SOURCE, subreddit = subreddit, error = %err, "subreddit fetch failed");
                }
            }
        }

        Ok(jobs)
    }
}

fn parse_post(data: &serde_json::Value, subreddit: &str) -> Option<RawJob> {
    let title = data.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }
    let selftext = data
        .get("selftext")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let combined = format!("{} {}", title, selftext).to_lowercase();
    if LOOKING_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return None;
    }
    if !HIRING_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return None;
    }

    let source_id = data
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())?
        .to_string();

    let url = match data.get("permalink").and_then(|v| v.as_str()) {
        Some(permalink) if !permalink.is_empty() => format!("{}{}", BASE_URL, permalink),
        _ => data.get("url").and_then(|v| v.as_str())?.to_string(),
    };

    let posted_at = data
        .get("created_utc")
        .and_then(|v| v.as_f64())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0));

    let mut tags = vec![format!("r/{}", subreddit)];
    if let Some(flair) = data.get("link_flair_text").and_then(|v| v.as_str()) {
        if !flair.is_empty() {
            tags.push(flair.to_string());
        }
    }

    let description = (!selftext.is_empty())
        .then(|| pipeline::truncate_chars(selftext, DESCRIPTION_LIMIT));
    let salary_text = extract_salary_span(&format!("{} {}", title, selftext));

    Some(RawJob {
        source: SOURCE,
        source_id,
        title: clean_title(title),
        company: extract_company(title),
        description,
        location: Some("Remote".to_string()),
        salary_text,
        url,
        tags,
        posted_at,
        ..Default::default()
    })
}

/// Best-effort company name from common title shapes.
fn extract_company(title: &str) -> String {
    if let Some(cap) = BRACKET_COMPANY_RE.captures(title) {
        let company = cap[1].trim();
        if !company.is_empty() {
            return company.to_string();
        }
    }
    if let Some(cap) = AT_COMPANY_RE.captures(title) {
        let company = cap[1].trim();
        if company.len() > 2 && company.len() < 50 {
            return company.to_string();
        }
    }
    if let Some(cap) = IS_HIRING_RE.captures(title) {
        let company = cap[1].trim();
        if !company.is_empty() {
            return company.to_string();
        }
    }
    "Unknown (Reddit)".to_string()
}

/// Strip markers, company prefixes and salary noise from a post title.
fn clean_title(title: &str) -> String {
    let mut cleaned = PREFIX_RE.replace(title, "").to_string();
    cleaned = LEADING_SEGMENT_RE.replace(&cleaned, "").to_string();
    cleaned = TITLE_SALARY_RE.replace_all(&cleaned, "").to_string();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        return pipeline::truncate_chars(title, TITLE_LIMIT);
    }
    pipeline::truncate_chars(&cleaned, TITLE_LIMIT)
}

/// First salary-looking span in the text, if any.
fn extract_salary_span(text: &str) -> Option<String> {
    SALARY_SPAN_RE.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(title: &str, selftext: &str) -> serde_json::Value {
        json!({
            "id": "abc123",
            "title": title,
            "selftext": selftext,
            "permalink": "/r/remotejobs/comments/abc123/post/",
            "created_utc": 1_750_000_000.0,
            "link_flair_text": "Hiring"
        })
    }

    #[test]
    fn accepts_hiring_posts() {
        let raw = parse_post(
            &post("[Hiring] Acme - Chat Support Agent, $18/hr", "Respond to customers over chat."),
            "remotejobs",
        )
        .unwrap();
        assert_eq!(raw.source, "reddit");
        assert_eq!(raw.source_id, "abc123");
        assert_eq!(raw.company, "Acme");
        assert_eq!(raw.url, "https://www.reddit.com/r/remotejobs/comments/abc123/post/");
        assert_eq!(raw.tags, vec!["r/remotejobs", "Hiring"]);
        assert!(raw.posted_at.is_some());
        assert_eq!(raw.salary_text.as_deref(), Some("$18/hr"));
    }

    #[test]
    fn rejects_looking_for_work_posts() {
        assert!(parse_post(
            &post("Available for hire: virtual assistant", "I am seeking work."),
            "forhire"
        )
        .is_none());
    }

    #[test]
    fn rejects_posts_without_hiring_signals() {
        assert!(parse_post(
            &post("Weekly discussion thread", "Talk about anything."),
            "WorkOnline"
        )
        .is_none());
    }

    #[test]
    fn extracts_company_from_bracket_pattern() {
        assert_eq!(extract_company("[Hiring] Initech - Data Entry"), "Initech");
    }

    #[test]
    fn extracts_company_from_at_pattern() {
        assert_eq!(extract_company("Support Agent at Globex Corp"), "Globex Corp");
    }

    #[test]
    fn extracts_company_from_is_hiring_pattern() {
        assert_eq!(extract_company("Hooli is hiring remote moderators"), "Hooli");
    }

    #[test]
    fn falls_back_to_unknown_company() {
        assert_eq!(extract_company("remote work thread"), "Unknown (Reddit)");
    }

    #[test]
    fn cleans_markers_and_salary_from_titles() {
        let cleaned = clean_title("[Hiring] Acme - Chat Support Agent $18/hr");
        assert_eq!(cleaned, "Chat Support Agent");
    }

    #[test]
    fn extracts_salary_spans() {
        assert_eq!(
            extract_salary_span("pay is $50,000 - $70,000 per year").as_deref(),
            Some("$50,000 - $70,000")
        );
        assert_eq!(
            extract_salary_span("roughly 60k-80k depending").as_deref(),
            Some("60k-80k")
        );
        assert!(extract_salary_span("competitive pay").is_none());
    }
}
