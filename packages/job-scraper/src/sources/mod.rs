//! Source collaborators: one implementation per external job board.
//!
//! Each source differs only in how it acquires and decodes raw records;
//! the pipeline never needs to know which site it is talking to beyond the
//! name stamped onto each record.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::types::RawJob;

pub mod indeed;
pub mod reddit;
pub mod remoteok;
pub mod wellfound;
pub mod weworkremotely;

pub use indeed::IndeedSource;
pub use reddit::RedditSource;
pub use remoteok::RemoteOkSource;
pub use wellfound::WellfoundSource;
pub use weworkremotely::WeWorkRemotelySource;

/// One external origin of job postings.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable source name, also stamped on every raw record.
    fn name(&self) -> &'static str;

    /// Produce the current finite sequence of raw records for this source.
    ///
    /// May fail wholesale (network or structural errors); individually
    /// malformed items are dropped rather than failing the batch.
    async fn fetch(&self) -> Result<Vec<RawJob>, ScrapeError>;
}

/// All production sources, in the fixed order runs iterate them.
pub fn default_sources(
    config: &ScraperConfig,
) -> Result<Vec<Arc<dyn JobSource>>, ScrapeError> {
    Ok(vec![
        Arc::new(RemoteOkSource::new(config)?),
        Arc::new(WeWorkRemotelySource::new(config)?),
        Arc::new(RedditSource::new(config)?),
        Arc::new(IndeedSource::new(config)?),
        Arc::new(WellfoundSource::new(config)?),
    ])
}

/// Build the HTTP client shared by a source's requests.
pub(crate) fn http_client(
    config: &ScraperConfig,
    user_agent: &str,
) -> Result<reqwest::Client, ScrapeError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// Synthetic source-local id for listings that expose no usable identifier.
///
/// Digest of the identifying parts, so the same listing keeps the same id
/// across runs.
pub(crate) fn synthetic_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())[..12].to_string()
}
