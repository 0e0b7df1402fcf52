//! Snapshot store
//!
//! Holds the published [`Topology`] behind an `Arc`. Readers clone the `Arc`
//! and never wait on writers. Writers build a private candidate, then swap
//! it in through a [`PublishGuard`], which is the only way to publish and
//! which holds the store's exclusive write lock for as long as it lives.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use log::debug;
use tokio::sync::{Mutex, MutexGuard};

use crate::model::Topology;

/// The currently published topology plus its writer lock
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Topology>>,
    write_lock: Mutex<()>,
}

/// Exclusive right to publish into a [`SnapshotStore`]
pub struct PublishGuard<'a> {
    store: &'a SnapshotStore,
    _lock: MutexGuard<'a, ()>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing topology without bumping its generation.
    pub fn with_snapshot(topology: Topology) -> Self {
        Self {
            current: RwLock::new(Arc::new(topology)),
            write_lock: Mutex::new(()),
        }
    }

    /// The published topology. Never waits on the write lock.
    pub fn snapshot(&self) -> Arc<Topology> {
        // The slot only ever holds a complete Arc, so a poisoned lock still
        // guards a valid value.
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Wait for the write lock.
    pub async fn lock(&self) -> PublishGuard<'_> {
        let lock = self.write_lock.lock().await;
        PublishGuard { store: self, _lock: lock }
    }

    /// Take the write lock only if it is free.
    pub fn try_lock(&self) -> Option<PublishGuard<'_>> {
        let lock = self.write_lock.try_lock().ok()?;
        Some(PublishGuard { store: self, _lock: lock })
    }

    pub fn is_locked(&self) -> bool {
        self.write_lock.try_lock().is_err()
    }
}

impl PublishGuard<'_> {
    /// The published topology as of now; stable while this guard is held.
    pub fn current(&self) -> Arc<Topology> {
        self.store.snapshot()
    }

    /// Replace the published topology with `candidate` in one step.
    ///
    /// Stamps the next generation and the refresh time.
    pub fn publish(&self, mut candidate: Topology) -> Arc<Topology> {
        candidate.generation = self.current().generation + 1;
        candidate.refreshed_at = Some(Utc::now());
        let published = Arc::new(candidate);

        {
            let mut slot = self
                .store
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = Arc::clone(&published);
        }

        debug!(
            "Published snapshot generation {} ({} applications, {} server groups)",
            published.generation,
            published.applications.len(),
            published.server_group_count()
        );
        published
    }
}
