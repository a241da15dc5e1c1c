use thiserror::Error;

/// Source-level failures during acquisition or ingestion.
///
/// Record-level malformation is not an error: individually bad items are
/// dropped where they are parsed. Anything that surfaces here fails the
/// whole source run (and only that source's run).
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload from {url}: {message}")]
    Payload { url: String, message: String },

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Returned when parsing a category name outside the closed set.
#[derive(Debug, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);
