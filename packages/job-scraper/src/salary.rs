//! Shared salary normalization.
//!
//! Every source feeds the same policy: extract numeric tokens, resolve "k"
//! shorthand, convert hourly rates to annual figures, and discard values
//! outside a plausible annual window. Sources differ only in how they
//! extract the text or numbers they pass in.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Full-time assumption for hourly-to-annual conversion.
const HOURS_PER_WEEK: f64 = 40.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Plausible annual-salary window in USD; values outside are discarded.
const MIN_ANNUAL: i64 = 10_000;
const MAX_ANNUAL: i64 = 500_000;

/// Unit of a salary figure as reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SalaryUnit {
    Annual,
    Hourly,
    #[default]
    Unknown,
}

lazy_static! {
    /// Comma-grouped integers or decimals, with optional "k" shorthand.
    static ref AMOUNT_RE: Regex =
        Regex::new(r"(?i)(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(k\b)?").unwrap();
}

fn is_hourly(text: &str, hint: SalaryUnit) -> bool {
    match hint {
        SalaryUnit::Hourly => true,
        SalaryUnit::Annual => false,
        SalaryUnit::Unknown => text.contains("/hr") || text.contains("hour"),
    }
}

/// Normalize a free-text salary hint into a bounded annual range.
///
/// Returns both bounds or nothing; a single surviving value is returned as
/// both min and max.
pub fn normalize_text(text: &str, hint: SalaryUnit) -> Option<(i64, i64)> {
    let lower = text.to_lowercase();
    let hourly = is_hourly(&lower, hint);

    let mut values = Vec::new();
    for cap in AMOUNT_RE.captures_iter(&lower) {
        let number = cap[1].replace(',', "");
        let mut value = match number.parse::<f64>() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if cap.get(2).is_some() {
            value *= 1000.0;
        }
        if hourly {
            value *= HOURS_PER_WEEK * WEEKS_PER_YEAR;
        }
        values.push(value.round() as i64);
    }

    bounded_range(values)
}

/// Normalize structured salary numbers reported directly by a source.
pub fn normalize_pair(
    min: Option<f64>,
    max: Option<f64>,
    hint: SalaryUnit,
) -> Option<(i64, i64)> {
    let factor = if hint == SalaryUnit::Hourly {
        HOURS_PER_WEEK * WEEKS_PER_YEAR
    } else {
        1.0
    };

    let values: Vec<i64> = [min, max]
        .into_iter()
        .flatten()
        .map(|v| (v * factor).round() as i64)
        .collect();

    bounded_range(values)
}

/// Apply the sanity window and collapse survivors into a range.
fn bounded_range(values: Vec<i64>) -> Option<(i64, i64)> {
    let survivors: Vec<i64> = values
        .into_iter()
        .filter(|v| (MIN_ANNUAL..=MAX_ANNUAL).contains(v))
        .collect();

    let min = survivors.iter().copied().min()?;
    let max = survivors.iter().copied().max()?;
    Some((min, max))
}
