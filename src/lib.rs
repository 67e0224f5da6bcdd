//! # basecoat-search
//!
//! Multi-tenant, memory-only full-text search over formula and job records.
//! Built on [Tantivy](https://github.com/quickwit-oss/tantivy).
//!
//! Every tenant gets one index per [`RecordKind`]. Indexes are derived from a
//! [`RecordStore`], patched per record as mutations commit, and fully rebuilt
//! on an interval by the [`RebuildScheduler`] so any missed patch heals.
//! The index is never the system of record.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use basecoat_search::models::{Formula, Indexable};
//! use basecoat_search::{MemoryStore, RebuildScheduler, RecordKind, SearchConfig, SearchService};
//! use std::sync::Arc;
//!
//! # async fn run() -> basecoat_search::Result<()> {
//! basecoat_search::telemetry::init_tracing();
//!
//! let store = Arc::new(MemoryStore::new());
//! let formula = Formula { id: "f1".into(), name: "Sea Foam".into(), ..Default::default() };
//! store.put("acme", RecordKind::Formula, formula.to_record()?);
//!
//! let service = SearchService::new(store.clone(), SearchConfig::from_env())?;
//! let scheduler = RebuildScheduler::for_service(Arc::clone(&service));
//! let handle = scheduler.spawn();
//!
//! // After the store commits a change:
//! service.spawn_upsert("acme", RecordKind::Formula, "f1");
//!
//! let ids = service.search("acme", RecordKind::Formula, "sea-foam")?;
//! # scheduler.shutdown();
//! # let _ = handle.await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Queries
//!
//! A phrase is lower-cased, stripped of query-syntax characters
//! ([`query::sanitize`]), split on whitespace, and every term must occur as a
//! substring of some string field of the record. `"test-name"` therefore
//! matches a record named `test-name`; an empty phrase matches nothing.

pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod query;
pub mod rebuild;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use index::registry::IndexRegistry;
pub use index::TenantIndex;
pub use query::QueryExecutor;
pub use rebuild::RebuildReport;
pub use scheduler::{RebuildScheduler, SchedulerState};
pub use service::SearchService;
pub use store::{MemoryStore, RecordStore, StoreError};
pub use types::*;
