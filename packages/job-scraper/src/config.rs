use std::time::Duration;

/// Tunables threaded into every source at construction time.
///
/// There are deliberately no module-wide defaults to mutate; callers build
/// one of these and hand it to `sources::default_sources`.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Upper bound on any single acquisition request.
    pub request_timeout: Duration,
    /// Politeness delay between consecutive fetches within a source.
    pub fetch_delay: Duration,
    /// Result pages fetched per Indeed search query.
    pub indeed_pages_per_search: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            fetch_delay: Duration::from_secs(1),
            indeed_pages_per_search: 2,
        }
    }
}
