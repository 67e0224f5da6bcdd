use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use std::sync::{Arc, Condvar, Mutex};

/// Limits shared by every [`TenantIndex`](crate::index::TenantIndex) in a service.
///
/// Writers are created per mutation and dropped after commit, so the number
/// alive at once is bounded by concurrent upserts plus the rebuild. The
/// budget caps that number and rejects oversized documents before they reach
/// tantivy. A writer request over the cap blocks until a slot frees; callers
/// run it on the blocking pool.
pub struct WriterBudget {
    writer_heap_bytes: usize,
    max_concurrent_writers: usize,
    max_document_bytes: usize,
    slots: Arc<WriterSlots>,
}

struct WriterSlots {
    active: Mutex<usize>,
    released: Condvar,
}

impl WriterBudget {
    pub fn new(writer_heap_bytes: usize, max_concurrent_writers: usize, max_document_bytes: usize) -> Self {
        WriterBudget {
            writer_heap_bytes,
            max_concurrent_writers: max_concurrent_writers.max(1),
            max_document_bytes,
            slots: Arc::new(WriterSlots {
                active: Mutex::new(0),
                released: Condvar::new(),
            }),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.writer_heap_bytes,
            config.max_concurrent_writers,
            config.max_document_bytes,
        )
    }

    /// Take a writer slot, waiting for one to be released if all are in use.
    pub fn acquire_writer(&self) -> WriterGuard {
        let mut active = self.slots.active.lock().unwrap_or_else(|e| e.into_inner());
        if *active >= self.max_concurrent_writers {
            tracing::debug!(
                active = *active,
                max = self.max_concurrent_writers,
                "[INDEX] waiting for a writer slot"
            );
        }
        while *active >= self.max_concurrent_writers {
            active = self
                .slots
                .released
                .wait(active)
                .unwrap_or_else(|e| e.into_inner());
        }
        *active += 1;

        WriterGuard {
            slots: Arc::clone(&self.slots),
        }
    }

    /// Take a writer slot only if one is free right now.
    pub fn try_acquire_writer(&self) -> Option<WriterGuard> {
        let mut active = self.slots.active.lock().unwrap_or_else(|e| e.into_inner());
        if *active >= self.max_concurrent_writers {
            return None;
        }
        *active += 1;
        Some(WriterGuard {
            slots: Arc::clone(&self.slots),
        })
    }

    pub fn validate_document_size(&self, doc_size_bytes: usize) -> Result<()> {
        if doc_size_bytes > self.max_document_bytes {
            return Err(SearchError::DocumentTooLarge {
                size: doc_size_bytes,
                max: self.max_document_bytes,
            });
        }
        Ok(())
    }

    pub fn writer_heap_bytes(&self) -> usize {
        self.writer_heap_bytes
    }

    pub fn max_concurrent_writers(&self) -> usize {
        self.max_concurrent_writers
    }

    pub fn active_writers(&self) -> usize {
        *self.slots.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for WriterBudget {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Holds one writer slot; dropping it wakes a waiting writer.
pub struct WriterGuard {
    slots: Arc<WriterSlots>,
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        let mut active = self.slots.active.lock().unwrap_or_else(|e| e.into_inner());
        *active = active.saturating_sub(1);
        self.slots.released.notify_one();
    }
}
