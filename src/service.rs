use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::index::budget::WriterBudget;
use crate::index::run_blocking;
use crate::index::registry::IndexRegistry;
use crate::query::QueryExecutor;
use crate::rebuild::{rebuild_all, RebuildReport};
use crate::store::{with_deadline, RecordStore};
use crate::types::{RecordId, RecordKind};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

/// Search over a tenant's formulas and jobs.
///
/// The service is the only owner of index state: construct one at startup
/// and share the returned `Arc` with the request layer and the
/// [`RebuildScheduler`](crate::scheduler::RebuildScheduler).
///
/// The index is a cache of the record store, not a source of truth. Updates
/// are best-effort; anything missed is corrected by the next full rebuild,
/// so callers must tolerate brief staleness.
///
/// # Examples
///
/// ```rust,no_run
/// use basecoat_search::{MemoryStore, RecordKind, SearchConfig, SearchService};
/// use std::sync::Arc;
///
/// # async fn run() -> basecoat_search::Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// let service = SearchService::new(store, SearchConfig::from_env())?;
/// service.rebuild_now().await?;
/// let ids = service.search("acme", RecordKind::Formula, "sea foam")?;
/// # Ok(())
/// # }
/// ```
pub struct SearchService {
    store: Arc<dyn RecordStore>,
    registry: IndexRegistry,
    executor: QueryExecutor,
    config: SearchConfig,
    rebuild_lock: tokio::sync::Mutex<()>,
    last_rebuild: RwLock<Option<RebuildReport>>,
}

impl SearchService {
    pub fn new(store: Arc<dyn RecordStore>, config: SearchConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let budget = Arc::new(WriterBudget::from_config(&config));
        Ok(Arc::new(SearchService {
            store,
            registry: IndexRegistry::new(budget),
            executor: QueryExecutor::new().with_max_results(config.max_results),
            config,
            rebuild_lock: tokio::sync::Mutex::new(()),
            last_rebuild: RwLock::new(None),
        }))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Return the IDs of the tenant's records of `kind` that contain every
    /// term of `phrase`.
    ///
    /// # Errors
    ///
    /// [`SearchError::TenantNotFound`] if the tenant has no index for `kind`
    /// yet, which lets callers tell "no matches" from "not indexed".
    pub fn search(&self, tenant_id: &str, kind: RecordKind, phrase: &str) -> Result<Vec<RecordId>> {
        let index = self
            .registry
            .get(tenant_id, kind)
            .ok_or_else(|| SearchError::TenantNotFound(tenant_id.to_string()))?;
        self.executor.execute(&index, phrase)
    }

    pub fn search_formulas(&self, tenant_id: &str, phrase: &str) -> Result<Vec<RecordId>> {
        self.search(tenant_id, RecordKind::Formula, phrase)
    }

    pub fn search_jobs(&self, tenant_id: &str, phrase: &str) -> Result<Vec<RecordId>> {
        self.search(tenant_id, RecordKind::Job, phrase)
    }

    async fn try_upsert(&self, tenant_id: &str, kind: RecordKind, id: &str) -> Result<()> {
        let record = with_deadline(
            "get_record",
            self.config.store_timeout,
            self.store.get_record(tenant_id, kind, id),
        )
        .await?;
        let index = self.registry.get_or_create(tenant_id, kind)?;
        run_blocking(move || index.upsert(&record)).await
    }

    /// Re-read record `id` from the store and index its current state.
    ///
    /// Best-effort: a failed fetch or index write is logged and the index is
    /// left untouched until the next rebuild.
    pub async fn upsert(&self, tenant_id: &str, kind: RecordKind, id: &str) {
        match self.try_upsert(tenant_id, kind, id).await {
            Ok(()) => {
                tracing::debug!(tenant = tenant_id, %kind, id, "[INDEX] upserted record");
            }
            Err(e) if e.is_upstream() => {
                tracing::warn!(
                    tenant = tenant_id,
                    %kind,
                    id,
                    error = %e,
                    "[INDEX] could not fetch record, skipping update"
                );
            }
            Err(e) => {
                tracing::error!(tenant = tenant_id, %kind, id, error = %e, "[INDEX] failed to index record");
            }
        }
    }

    /// Remove record `id` from the tenant's index. No store access.
    pub async fn delete(&self, tenant_id: &str, kind: RecordKind, id: &str) {
        let Some(index) = self.registry.get(tenant_id, kind) else {
            tracing::debug!(tenant = tenant_id, %kind, id, "[INDEX] delete for unindexed tenant ignored");
            return;
        };
        let doc_id = id.to_string();
        if let Err(e) = run_blocking(move || index.delete(&doc_id)).await {
            tracing::error!(tenant = tenant_id, %kind, id, error = %e, "[INDEX] failed to remove record");
        }
    }

    pub async fn upsert_formula(&self, tenant_id: &str, id: &str) {
        self.upsert(tenant_id, RecordKind::Formula, id).await
    }

    pub async fn delete_formula(&self, tenant_id: &str, id: &str) {
        self.delete(tenant_id, RecordKind::Formula, id).await
    }

    pub async fn upsert_job(&self, tenant_id: &str, id: &str) {
        self.upsert(tenant_id, RecordKind::Job, id).await
    }

    pub async fn delete_job(&self, tenant_id: &str, id: &str) {
        self.delete(tenant_id, RecordKind::Job, id).await
    }

    /// Fire-and-forget [`upsert`](Self::upsert) on the tokio runtime.
    pub fn spawn_upsert(self: &Arc<Self>, tenant_id: &str, kind: RecordKind, id: &str) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let tenant_id = tenant_id.to_string();
        let id = id.to_string();
        tokio::spawn(async move { service.upsert(&tenant_id, kind, &id).await })
    }

    /// Fire-and-forget [`delete`](Self::delete) on the tokio runtime.
    pub fn spawn_delete(self: &Arc<Self>, tenant_id: &str, kind: RecordKind, id: &str) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let tenant_id = tenant_id.to_string();
        let id = id.to_string();
        tokio::spawn(async move { service.delete(&tenant_id, kind, &id).await })
    }

    /// Rebuild every tenant's indexes from the store now.
    ///
    /// Rebuilds never overlap: a call made while another is running waits for
    /// it to finish, then runs its own.
    pub async fn rebuild_now(&self) -> Result<RebuildReport> {
        let _running = self.rebuild_lock.lock().await;
        let report = rebuild_all(self.store.as_ref(), &self.registry, &self.config).await?;
        *self.last_rebuild.write().unwrap_or_else(|e| e.into_inner()) = Some(report.clone());
        Ok(report)
    }

    /// Report from the most recent successful rebuild.
    pub fn last_rebuild(&self) -> Option<RebuildReport> {
        self.last_rebuild
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn tenant_count(&self) -> usize {
        self.registry.tenant_count()
    }

    pub fn document_count(&self, tenant_id: &str, kind: RecordKind) -> Result<u64> {
        self.registry
            .get(tenant_id, kind)
            .map(|index| index.num_docs())
            .ok_or_else(|| SearchError::TenantNotFound(tenant_id.to_string()))
    }
}
