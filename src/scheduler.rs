use crate::service::SearchService;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Rebuilding,
}

/// Background loop that periodically re-derives every index from the store.
///
/// Runs a rebuild immediately, then sleeps `interval` after each one
/// finishes. A rebuild slower than the interval delays the next cycle rather
/// than overlapping it. Only the sleep is interruptible: `shutdown` during a
/// rebuild takes effect once that rebuild completes.
pub struct RebuildScheduler {
    service: Arc<SearchService>,
    interval: Duration,
    rebuilding: AtomicBool,
    cycles: AtomicU64,
    shutdown: Notify,
}

impl RebuildScheduler {
    pub fn new(service: Arc<SearchService>, interval: Duration) -> Arc<Self> {
        Arc::new(RebuildScheduler {
            service,
            interval,
            rebuilding: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            shutdown: Notify::new(),
        })
    }

    /// Scheduler using the service's configured interval.
    pub fn for_service(service: Arc<SearchService>) -> Arc<Self> {
        let interval = service.config().rebuild_interval;
        Self::new(service, interval)
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!(interval = ?self.interval, "[SCHEDULER] started");
        loop {
            self.rebuilding.store(true, Ordering::SeqCst);
            if let Err(e) = self.service.rebuild_now().await {
                tracing::warn!(error = %e, "[SCHEDULER] rebuild cycle failed");
            }
            self.rebuilding.store(false, Ordering::SeqCst);
            self.cycles.fetch_add(1, Ordering::SeqCst);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.notified() => {
                    tracing::info!("[SCHEDULER] shutting down");
                    break;
                }
            }
        }
    }

    /// Signal the loop to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn state(&self) -> SchedulerState {
        if self.rebuilding.load(Ordering::SeqCst) {
            SchedulerState::Rebuilding
        } else {
            SchedulerState::Idle
        }
    }

    /// Completed rebuild cycles, successful or not.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}
