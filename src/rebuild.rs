//! Full rebuild: re-derive every tenant's indexes from the record store.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::index::registry::{IndexRegistry, IndexSet};
use crate::index::{run_blocking, LoadStats};
use crate::store::{with_deadline, RecordStore};
use crate::types::{Record, RecordKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summary of one `rebuild_all` cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Tenants whose index set was replaced.
    pub tenants_rebuilt: usize,
    /// Tenants left on their previous generation because listing failed.
    pub tenants_kept: usize,
    pub records_indexed: usize,
    pub records_skipped: usize,
}

impl RebuildReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        RebuildReport {
            started_at,
            elapsed: Duration::ZERO,
            tenants_rebuilt: 0,
            tenants_kept: 0,
            records_indexed: 0,
            records_skipped: 0,
        }
    }
}

/// Rebuild the index set of every tenant the store knows about.
///
/// Fails only when tenants cannot be enumerated, in which case nothing is
/// swapped. A tenant whose records cannot be listed keeps its previous
/// indexes; a record that cannot be indexed is skipped.
pub async fn rebuild_all(
    store: &dyn RecordStore,
    registry: &IndexRegistry,
    config: &SearchConfig,
) -> Result<RebuildReport> {
    let start = Instant::now();
    let mut report = RebuildReport::new(Utc::now());

    let tenants = match with_deadline(
        "list_tenants",
        config.store_timeout,
        store.list_tenants(0, None),
    )
    .await
    {
        Ok(tenants) => tenants,
        Err(e) => {
            tracing::error!(error = %e, "[REBUILD] failed to list tenants, keeping current indexes");
            return Err(e);
        }
    };

    for tenant in &tenants {
        match rebuild_tenant(store, registry, config, tenant).await {
            Ok(stats) => {
                report.tenants_rebuilt += 1;
                report.records_indexed += stats.indexed;
                report.records_skipped += stats.skipped;
            }
            Err(e) => {
                tracing::error!(
                    tenant = %tenant,
                    error = %e,
                    "[REBUILD] tenant rebuild failed, keeping previous generation"
                );
                report.tenants_kept += 1;
            }
        }
    }

    report.elapsed = start.elapsed();
    tracing::info!(
        tenants = report.tenants_rebuilt,
        kept = report.tenants_kept,
        indexed = report.records_indexed,
        skipped = report.records_skipped,
        time_taken = ?report.elapsed,
        "[REBUILD] compiled index"
    );
    Ok(report)
}

/// Build a fresh set for one tenant and swap it in.
pub async fn rebuild_tenant(
    store: &dyn RecordStore,
    registry: &IndexRegistry,
    config: &SearchConfig,
    tenant: &str,
) -> Result<LoadStats> {
    let mut set = IndexSet::default();
    let mut total = LoadStats::default();

    for kind in RecordKind::ALL {
        let records = list_all_records(store, config, tenant, kind).await?;
        let index = Arc::new(registry.create_index()?);

        let loader = Arc::clone(&index);
        let stats = run_blocking(move || loader.load(records)).await?;

        tracing::debug!(
            tenant = %tenant,
            %kind,
            indexed = stats.indexed,
            skipped = stats.skipped,
            "[REBUILD] loaded index"
        );
        total.indexed += stats.indexed;
        total.skipped += stats.skipped;
        set.insert(kind, index);
    }

    registry.replace(tenant, set);
    Ok(total)
}

async fn list_all_records(
    store: &dyn RecordStore,
    config: &SearchConfig,
    tenant: &str,
    kind: RecordKind,
) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = with_deadline(
            "list_records",
            config.store_timeout,
            store.list_records(tenant, kind, offset, config.page_size),
        )
        .await?;
        let fetched = page.len();
        records.extend(page);
        if fetched == 0 || fetched < config.page_size {
            break;
        }
        offset += fetched;
    }

    Ok(records)
}
