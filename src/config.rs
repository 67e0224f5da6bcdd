use crate::error::{Result, SearchError};
use std::time::Duration;

/// Smallest per-thread heap tantivy accepts for an index writer.
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

/// Configuration for the search subsystem, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// How long the scheduler sleeps between full rebuilds.
    pub rebuild_interval: Duration,
    /// Deadline applied to every record store call.
    pub store_timeout: Duration,
    /// Records requested per `list_records` page during a rebuild.
    pub page_size: usize,
    /// Heap handed to each short-lived index writer.
    pub writer_heap_bytes: usize,
    /// Writers allowed to exist at once across all tenants.
    pub max_concurrent_writers: usize,
    /// Records whose flattened text exceeds this are skipped.
    pub max_document_bytes: usize,
    /// Cap on IDs returned from a single query; `None` returns every match.
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            rebuild_interval: Duration::from_secs(600),
            store_timeout: Duration::from_millis(5_000),
            page_size: 100,
            writer_heap_bytes: MIN_WRITER_HEAP_BYTES,
            max_concurrent_writers: 40,
            max_document_bytes: 1024 * 1024,
            max_results: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl SearchConfig {
    /// Load config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = SearchConfig::default();
        Self {
            rebuild_interval: env_parse::<u64>("BASECOAT_SEARCH_REBUILD_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rebuild_interval),
            store_timeout: env_parse::<u64>("BASECOAT_SEARCH_STORE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            page_size: env_parse("BASECOAT_SEARCH_PAGE_SIZE").unwrap_or(defaults.page_size),
            writer_heap_bytes: env_parse::<usize>("BASECOAT_SEARCH_WRITER_HEAP_MB")
                .map(|mb| mb * 1_000_000)
                .unwrap_or(defaults.writer_heap_bytes),
            max_concurrent_writers: env_parse("BASECOAT_SEARCH_MAX_CONCURRENT_WRITERS")
                .unwrap_or(defaults.max_concurrent_writers),
            max_document_bytes: env_parse::<usize>("BASECOAT_SEARCH_MAX_DOC_KB")
                .map(|kb| kb * 1024)
                .unwrap_or(defaults.max_document_bytes),
            max_results: env_parse("BASECOAT_SEARCH_MAX_RESULTS"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SearchError::Config("page_size must be at least 1".to_string()));
        }
        if self.rebuild_interval.is_zero() {
            return Err(SearchError::Config(
                "rebuild_interval must be non-zero".to_string(),
            ));
        }
        if self.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            return Err(SearchError::Config(format!(
                "writer_heap_bytes {} is below the minimum of {}",
                self.writer_heap_bytes, MIN_WRITER_HEAP_BYTES
            )));
        }
        if self.max_concurrent_writers == 0 {
            return Err(SearchError::Config(
                "max_concurrent_writers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
