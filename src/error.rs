use crate::store::StoreError;
use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SearchError {
    #[error("Tenant has no index: {0}")]
    TenantNotFound(String),

    #[error("Record store error: {0}")]
    Upstream(String),

    #[error("Record store call '{operation}' timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Document size {size} exceeds max {max} bytes")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("Tantivy error: {0}")]
    Tantivy(String),

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<tantivy::TantivyError> for SearchError {
    fn from(e: tantivy::TantivyError) -> Self {
        SearchError::Tantivy(e.to_string())
    }
}

impl From<tantivy::query::QueryParserError> for SearchError {
    fn from(e: tantivy::query::QueryParserError) -> Self {
        SearchError::QueryParse(e.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Json(e.to_string())
    }
}

impl From<StoreError> for SearchError {
    fn from(e: StoreError) -> Self {
        SearchError::Upstream(e.to_string())
    }
}

impl SearchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Upstream(_) => StatusCode::BAD_GATEWAY,
            SearchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            SearchError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            SearchError::DocumentTooLarge { .. } => StatusCode::BAD_REQUEST,
            SearchError::Tantivy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::QueryParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures that came from the record store rather than the index.
    pub fn is_upstream(&self) -> bool {
        matches!(self, SearchError::Upstream(_) | SearchError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;

    #[test]
    fn test_tenant_not_found_maps_to_404() {
        let err = SearchError::TenantNotFound("acme".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Tenant has no index: acme");
    }

    #[test]
    fn test_store_error_becomes_upstream() {
        let err: SearchError = StoreError::NotFound {
            tenant: "acme".to_string(),
            kind: RecordKind::Formula,
            id: "f1".to_string(),
        }
        .into();
        assert!(err.is_upstream());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_timeout_is_upstream() {
        let err = SearchError::Timeout {
            operation: "get_record".to_string(),
            after_ms: 50,
        };
        assert!(err.is_upstream());
        assert!(!SearchError::Tantivy("boom".to_string()).is_upstream());
    }
}
