/// Full rebuild: completeness, self-healing and degradation when the record
/// store is partially unavailable.
mod common;

use basecoat_search::{Record, RecordKind, SearchError};
use common::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_rebuild_indexes_every_record_across_pages() {
    let store = seeded_store();
    for i in 0..7 {
        put_formula(&store, "acme", &formula(&format!("p{}", i), "Primer Gray"));
    }
    let service = service_for(&store);

    let report = service.rebuild_now().await.unwrap();

    assert_eq!(report.tenants_rebuilt, 2);
    assert_eq!(report.tenants_kept, 0);
    assert_eq!(report.records_indexed, 12);
    assert_eq!(report.records_skipped, 0);
    assert_eq!(service.tenant_count(), 2);
    assert_eq!(service.document_count("acme", RecordKind::Formula).unwrap(), 10);
    assert_eq!(service.search_formulas("acme", "primer").unwrap().len(), 7);
}

#[tokio::test]
async fn test_rebuild_creates_both_kinds_for_every_tenant() {
    let store = seeded_store();
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    // globex has no jobs but still gets an (empty) job index.
    assert!(service.search_jobs("globex", "anything").unwrap().is_empty());
    assert_eq!(service.document_count("globex", RecordKind::Job).unwrap(), 0);
}

#[tokio::test]
async fn test_rebuild_heals_missed_updates() {
    let store = seeded_store();
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    // Mutations that never reached the index.
    put_formula(&store, "acme", &formula("f1", "Ocean Mist"));
    store.remove("acme", RecordKind::Formula, "f3");
    assert!(service.search_formulas("acme", "ocean").unwrap().is_empty());

    service.rebuild_now().await.unwrap();

    assert_eq!(service.search_formulas("acme", "ocean").unwrap(), vec!["f1"]);
    assert!(service.search_formulas("acme", "apple").unwrap().is_empty());
    assert!(service.search_formulas("acme", "foam").unwrap().is_empty());
}

#[tokio::test]
async fn test_tenant_enumeration_failure_keeps_existing_indexes() {
    let store = seeded_store();
    let service = service_for(&store);
    let first = service.rebuild_now().await.unwrap();

    put_formula(&store, "acme", &formula("f1", "Ocean Mist"));
    store.fail_tenant_listing(true);

    let err = service.rebuild_now().await.unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(service.search_formulas("acme", "sea").unwrap(), vec!["f1"]);
    assert_eq!(
        service.last_rebuild().unwrap().started_at,
        first.started_at
    );

    store.fail_tenant_listing(false);
    service.rebuild_now().await.unwrap();
    assert_eq!(service.search_formulas("acme", "ocean").unwrap(), vec!["f1"]);
}

#[tokio::test]
async fn test_list_failure_keeps_tenant_previous_generation() {
    let store = seeded_store();
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    put_formula(&store, "acme", &formula("f1", "Ocean Mist"));
    put_formula(&store, "globex", &formula("g1", "Ocean Breeze"));
    store.fail_list("acme", RecordKind::Job, true);

    let report = service.rebuild_now().await.unwrap();

    assert_eq!(report.tenants_rebuilt, 1);
    assert_eq!(report.tenants_kept, 1);
    // acme's formulas listed fine, but its set is swapped all or nothing.
    assert_eq!(service.search_formulas("acme", "sea").unwrap(), vec!["f1"]);
    assert_eq!(service.search_formulas("globex", "ocean").unwrap(), vec!["g1"]);
}

#[tokio::test]
async fn test_unindexable_records_are_skipped() {
    let store = seeded_store();
    store.put("acme", RecordKind::Formula, Record::new("bad", json!("not an object")));
    let service = service_for(&store);

    let report = service.rebuild_now().await.unwrap();

    assert_eq!(report.records_skipped, 1);
    assert_eq!(service.document_count("acme", RecordKind::Formula).unwrap(), 3);
}

#[tokio::test]
async fn test_tenant_without_records_gets_empty_indexes() {
    let store = seeded_store();
    store.add_tenant("hooli");
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    assert!(service.search_formulas("hooli", "sea").unwrap().is_empty());
}

#[tokio::test]
async fn test_reader_of_old_generation_is_unaffected_by_swap() {
    let store = seeded_store();
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    let old = service.registry().get("acme", RecordKind::Formula).unwrap();
    store.remove("acme", RecordKind::Formula, "f1");
    service.rebuild_now().await.unwrap();

    let current = service.registry().get("acme", RecordKind::Formula).unwrap();
    assert!(!Arc::ptr_eq(&old, &current));
    assert_eq!(old.num_docs(), 3);
    assert_eq!(current.num_docs(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_searches_during_rebuild_always_see_an_index() {
    let store = seeded_store();
    for i in 0..50 {
        put_formula(&store, "acme", &formula(&format!("p{}", i), "Primer Gray"));
    }
    let service = service_for(&store);
    service.rebuild_now().await.unwrap();

    let rebuilder = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            for _ in 0..5 {
                service.rebuild_now().await.unwrap();
            }
        })
    };

    while !rebuilder.is_finished() {
        match service.search_formulas("acme", "sea") {
            Ok(ids) => assert_eq!(ids, vec!["f1"]),
            Err(SearchError::TenantNotFound(_)) => panic!("index vanished during rebuild"),
            Err(e) => panic!("unexpected error: {}", e),
        }
        tokio::task::yield_now().await;
    }
    rebuilder.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_manual_rebuilds_are_serialized() {
    let store = seeded_store();
    let service = service_for(&store);

    let a = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.rebuild_now().await })
    };
    let b = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.rebuild_now().await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!(a.tenants_rebuilt, 2);
    assert_eq!(b.tenants_rebuilt, 2);
    assert_eq!(service.tenant_count(), 2);
    assert!(service.last_rebuild().is_some());
}
