use basecoat_search::models::{Formula, Indexable, Job};
use basecoat_search::{MemoryStore, RecordKind, SearchConfig, SearchService};
use std::sync::Arc;
use std::time::Duration;

pub fn test_config() -> SearchConfig {
    SearchConfig {
        rebuild_interval: Duration::from_millis(50),
        store_timeout: Duration::from_millis(200),
        page_size: 2,
        ..SearchConfig::default()
    }
}

pub fn formula(id: &str, name: &str) -> Formula {
    Formula {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn job(id: &str, name: &str) -> Job {
    Job {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn put_formula(store: &MemoryStore, tenant: &str, formula: &Formula) {
    store.put(tenant, RecordKind::Formula, formula.to_record().unwrap());
}

#[allow(dead_code)]
pub fn put_job(store: &MemoryStore, tenant: &str, job: &Job) {
    store.put(tenant, RecordKind::Job, job.to_record().unwrap());
}

/// Store with two tenants: acme has three formulas and a job, globex one formula.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    put_formula(&store, "acme", &formula("f1", "Sea Foam"));
    put_formula(&store, "acme", &formula("f2", "test-name"));
    put_formula(&store, "acme", &formula("f3", "Red Apple"));
    put_job(&store, "acme", &job("j1", "Kitchen Remodel"));
    put_formula(&store, "globex", &formula("g1", "Sea Breeze"));
    store
}

pub fn service_for(store: &Arc<MemoryStore>) -> Arc<SearchService> {
    SearchService::new(store.clone(), test_config()).unwrap()
}

#[allow(dead_code)]
pub fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}
