//! The record store boundary.
//!
//! The index never owns data: it is populated from a [`RecordStore`], which
//! is the system of record. [`MemoryStore`] is an in-process implementation
//! for embedding and tests.

use crate::types::{Record, RecordId, RecordKind, TenantId};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{kind} '{id}' not found for tenant '{tenant}'")]
    NotFound {
        tenant: TenantId,
        kind: RecordKind,
        id: RecordId,
    },

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Run a store call under `timeout`; a timeout is reported like any other
/// upstream failure.
pub(crate) async fn with_deadline<T>(
    operation: &str,
    timeout: Duration,
    call: impl std::future::Future<Output = StoreResult<T>>,
) -> crate::error::Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(crate::error::SearchError::Timeout {
            operation: operation.to_string(),
            after_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Read access to the durable record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List tenant identifiers. `limit: None` returns every tenant from `offset` on.
    async fn list_tenants(&self, offset: usize, limit: Option<usize>) -> StoreResult<Vec<TenantId>>;

    /// List one page of a tenant's records of `kind`, ordered by ID.
    async fn list_records(
        &self,
        tenant: &str,
        kind: RecordKind,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<Record>>;

    async fn get_record(&self, tenant: &str, kind: RecordKind, id: &str) -> StoreResult<Record>;
}

/// A `DashMap`-backed record store.
///
/// Besides plain storage it can simulate outages (tenant enumeration, single
/// lookups, per-tenant listing) and slow lookups, which is what the
/// degrade-and-self-heal paths of the index need to be exercised against.
#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<BTreeSet<TenantId>>,
    records: DashMap<(TenantId, RecordKind), BTreeMap<RecordId, Record>>,
    fail_tenant_listing: AtomicBool,
    failing_lists: DashSet<(TenantId, RecordKind)>,
    failing_gets: DashSet<(TenantId, RecordKind, RecordId)>,
    get_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, tenant: &str) {
        self.tenants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tenant.to_string());
    }

    /// Insert or replace a record, registering its tenant if needed.
    pub fn put(&self, tenant: &str, kind: RecordKind, record: Record) {
        self.add_tenant(tenant);
        self.records
            .entry((tenant.to_string(), kind))
            .or_default()
            .insert(record.id.clone(), record);
    }

    pub fn remove(&self, tenant: &str, kind: RecordKind, id: &str) -> Option<Record> {
        self.records
            .get_mut(&(tenant.to_string(), kind))
            .and_then(|mut records| records.remove(id))
    }

    pub fn record_count(&self, tenant: &str, kind: RecordKind) -> usize {
        self.records
            .get(&(tenant.to_string(), kind))
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Make `list_tenants` fail until reset.
    pub fn fail_tenant_listing(&self, fail: bool) {
        self.fail_tenant_listing.store(fail, Ordering::SeqCst);
    }

    /// Make `list_records` fail for one tenant and kind until reset.
    pub fn fail_list(&self, tenant: &str, kind: RecordKind, fail: bool) {
        let key = (tenant.to_string(), kind);
        if fail {
            self.failing_lists.insert(key);
        } else {
            self.failing_lists.remove(&key);
        }
    }

    /// Make `get_record` fail for one record until reset.
    pub fn fail_get(&self, tenant: &str, kind: RecordKind, id: &str, fail: bool) {
        let key = (tenant.to_string(), kind, id.to_string());
        if fail {
            self.failing_gets.insert(key);
        } else {
            self.failing_gets.remove(&key);
        }
    }

    /// Delay every `get_record` call, for exercising timeouts.
    pub fn set_get_delay(&self, delay: Option<Duration>) {
        *self.get_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_tenants(&self, offset: usize, limit: Option<usize>) -> StoreResult<Vec<TenantId>> {
        if self.fail_tenant_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "tenant listing is failing".to_string(),
            ));
        }
        let tenants = self.tenants.read().unwrap_or_else(|e| e.into_inner());
        let iter = tenants.iter().skip(offset).cloned();
        Ok(match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }

    async fn list_records(
        &self,
        tenant: &str,
        kind: RecordKind,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<Record>> {
        let key = (tenant.to_string(), kind);
        if self.failing_lists.contains(&key) {
            return Err(StoreError::Unavailable(format!(
                "listing {} records for {} is failing",
                kind, tenant
            )));
        }
        Ok(self
            .records
            .get(&key)
            .map(|records| records.values().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_record(&self, tenant: &str, kind: RecordKind, id: &str) -> StoreResult<Record> {
        let delay = *self.get_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failing_gets
            .contains(&(tenant.to_string(), kind, id.to_string()))
        {
            return Err(StoreError::Unavailable(format!("get {} {} is failing", kind, id)));
        }
        self.records
            .get(&(tenant.to_string(), kind))
            .and_then(|records| records.get(id).cloned())
            .ok_or_else(|| StoreError::NotFound {
                tenant: tenant.to_string(),
                kind,
                id: id.to_string(),
            })
    }
}
