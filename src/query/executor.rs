use crate::error::Result;
use crate::index::TenantIndex;
use crate::query::sanitizer;
use crate::types::RecordId;

/// Turns a free-text phrase into a conjunctive wildcard query against one index.
#[derive(Debug, Clone, Default)]
pub struct QueryExecutor {
    max_results: Option<usize>,
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sanitize `phrase`, split it into terms, and return the IDs of every
    /// document containing all of them.
    ///
    /// Result order is whatever the index yields; callers should treat it as
    /// a set.
    pub fn execute(&self, index: &TenantIndex, phrase: &str) -> Result<Vec<RecordId>> {
        let terms = sanitizer::terms(phrase);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let t0 = std::time::Instant::now();
        let ids = index.query(&terms, self.max_results)?;
        tracing::debug!(
            terms = ?terms,
            hits = ids.len(),
            elapsed = ?t0.elapsed(),
            "[QUERY] executed"
        );
        Ok(ids)
    }
}
