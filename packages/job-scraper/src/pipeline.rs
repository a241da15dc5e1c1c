//! Canonicalization: raw source records into canonical jobs.

use chrono::Utc;
use scraper::Html;

use crate::classify;
use crate::salary;
use crate::types::{Job, JobId, RawJob};

/// Hard cap on stored description length, in characters.
const DESCRIPTION_LIMIT: usize = 5_000;

/// Currency stamped on every canonical record.
const DEFAULT_CURRENCY: &str = "USD";

/// Turn a raw source record into a canonical job, or reject it.
///
/// Records missing a title, URL, or identity are dropped; a dropped record
/// never fails the surrounding source run. Classification and salary
/// normalization happen here so every source feeds the same policy.
pub fn canonicalize(raw: RawJob) -> Option<Job> {
    if raw.source.is_empty() || raw.source_id.is_empty() {
        return None;
    }
    if raw.title.trim().is_empty() || raw.url.trim().is_empty() {
        return None;
    }

    let salary = if raw.salary_min.is_some() || raw.salary_max.is_some() {
        salary::normalize_pair(raw.salary_min, raw.salary_max, raw.salary_unit)
    } else if let Some(text) = raw.salary_text.as_deref() {
        salary::normalize_text(text, raw.salary_unit)
    } else {
        None
    };
    let (salary_min, salary_max) = match salary {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    let category = classify::categorize(&raw.title, &raw.tags);
    let is_no_phone = classify::detect_no_phone(&raw.title, raw.description.as_deref());

    let company = if raw.company.trim().is_empty() {
        "Unknown".to_string()
    } else {
        raw.company.trim().to_string()
    };

    let now = Utc::now();
    Some(Job {
        id: JobId::derive(raw.source, &raw.source_id),
        source: raw.source.to_string(),
        source_id: raw.source_id,
        title: raw.title.trim().to_string(),
        company,
        company_logo: raw.company_logo,
        description: raw.description,
        location: raw.location,
        salary_min,
        salary_max,
        salary_currency: DEFAULT_CURRENCY.to_string(),
        url: raw.url.trim().to_string(),
        apply_url: raw.apply_url,
        tags: raw.tags,
        category,
        is_no_phone,
        posted_at: raw.posted_at,
        scraped_at: now,
        updated_at: now,
        is_active: true,
    })
}

/// Strip markup from an HTML fragment for storage as plain text.
pub fn clean_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, DESCRIPTION_LIMIT)
}

/// Truncate on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salary::SalaryUnit;
    use crate::types::Category;

    fn raw(title: &str, url: &str) -> RawJob {
        RawJob {
            source: "remoteok",
            source_id: "42".to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_missing_title_or_url() {
        assert!(canonicalize(raw("", "https://example.com/1")).is_none());
        assert!(canonicalize(raw("Support Agent", "")).is_none());
        assert!(canonicalize(raw("   ", "https://example.com/1")).is_none());
    }

    #[test]
    fn identity_ignores_mutable_fields() {
        let a = canonicalize(raw("Support Agent", "https://example.com/1")).unwrap();
        let mut other = raw("Completely Different Title", "https://example.com/other");
        other.salary_text = Some("$50,000 - $70,000".to_string());
        let b = canonicalize(other).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn classification_and_salary_are_applied() {
        let mut input = raw("Email Support Specialist", "https://example.com/1");
        input.salary_text = Some("$20/hr".to_string());
        let job = canonicalize(input).unwrap();
        assert_eq!(job.category, Category::Support);
        assert!(job.is_no_phone);
        assert_eq!(job.salary_min, Some(41_600));
        assert_eq!(job.salary_max, Some(41_600));
        assert_eq!(job.salary_currency, "USD");
        assert!(job.is_active);
    }

    #[test]
    fn numeric_hints_take_precedence_over_text() {
        let mut input = raw("Support Agent", "https://example.com/1");
        input.salary_min = Some(60_000.0);
        input.salary_max = Some(80_000.0);
        input.salary_unit = SalaryUnit::Annual;
        input.salary_text = Some("$10/hr".to_string());
        let job = canonicalize(input).unwrap();
        assert_eq!(job.salary_min, Some(60_000));
        assert_eq!(job.salary_max, Some(80_000));
    }

    #[test]
    fn blank_company_defaults_to_unknown() {
        let mut input = raw("Support Agent", "https://example.com/1");
        input.company = "  ".to_string();
        let job = canonicalize(input).unwrap();
        assert_eq!(job.company, "Unknown");
    }

    #[test]
    fn clean_html_strips_markup() {
        let cleaned = clean_html("<p>Work <b>remotely</b>.<br/>Chat only.</p>");
        assert!(!cleaned.contains('<'));
        assert!(cleaned.contains("Work"));
        assert!(cleaned.contains("remotely"));
        assert!(cleaned.contains("Chat only."));
    }

    #[test]
    fn clean_html_handles_plain_text() {
        assert_eq!(clean_html("already plain"), "already plain");
        assert_eq!(clean_html(""), "");
    }
}
