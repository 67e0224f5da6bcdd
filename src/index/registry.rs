use crate::error::Result;
use crate::index::budget::WriterBudget;
use crate::index::TenantIndex;
use crate::types::{RecordKind, TenantId};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// The per-kind indexes belonging to one tenant.
#[derive(Default, Clone)]
pub struct IndexSet {
    indexes: HashMap<RecordKind, Arc<TenantIndex>>,
}

impl IndexSet {
    pub fn get(&self, kind: RecordKind) -> Option<&Arc<TenantIndex>> {
        self.indexes.get(&kind)
    }

    pub fn insert(&mut self, kind: RecordKind, index: Arc<TenantIndex>) {
        self.indexes.insert(kind, index);
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// Tenant → index map shared by the rebuild task and request handlers.
///
/// Each tenant's [`IndexSet`] is replaced whole, under the map's shard lock,
/// and every index is handed out as an `Arc`. A query that already holds an
/// index keeps reading that generation even if a rebuild swaps in a new one
/// meanwhile; it never sees a half-populated index.
pub struct IndexRegistry {
    tenants: DashMap<TenantId, IndexSet>,
    budget: Arc<WriterBudget>,
}

impl IndexRegistry {
    pub fn new(budget: Arc<WriterBudget>) -> Self {
        IndexRegistry {
            tenants: DashMap::new(),
            budget,
        }
    }

    pub fn budget(&self) -> Arc<WriterBudget> {
        Arc::clone(&self.budget)
    }

    pub fn create_index(&self) -> Result<TenantIndex> {
        TenantIndex::create(self.budget())
    }

    pub fn get(&self, tenant_id: &str, kind: RecordKind) -> Option<Arc<TenantIndex>> {
        self.tenants
            .get(tenant_id)
            .and_then(|set| set.get(kind).map(Arc::clone))
    }

    /// Return the tenant's index for `kind`, creating an empty one first if
    /// the tenant has never been indexed.
    pub fn get_or_create(&self, tenant_id: &str, kind: RecordKind) -> Result<Arc<TenantIndex>> {
        if let Some(index) = self.get(tenant_id, kind) {
            return Ok(index);
        }

        let fresh = Arc::new(self.create_index()?);
        let mut set = self.tenants.entry(tenant_id.to_string()).or_default();
        let index = set
            .indexes
            .entry(kind)
            .or_insert_with(|| {
                tracing::info!(tenant = tenant_id, %kind, "[REGISTRY] created empty index");
                fresh
            });
        Ok(Arc::clone(index))
    }

    /// Swap in a fully built set for the tenant, discarding the previous one.
    pub fn replace(&self, tenant_id: &str, set: IndexSet) {
        self.tenants.insert(tenant_id.to_string(), set);
    }

    pub fn contains_tenant(&self, tenant_id: &str) -> bool {
        self.tenants.contains_key(tenant_id)
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.tenants.iter().map(|e| e.key().clone()).collect();
        tenants.sort();
        tenants
    }
}
