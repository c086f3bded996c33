//! Process-lifetime schedule deduplication.
//!
//! One [`DedupSet`] is shared by every pipeline run in the process. It is
//! not durable: a restart forgets everything. A key is only committed once
//! its event has been published, so a failed publish stays retryable on a
//! later run; an in-flight reservation stops two concurrent runs racing the
//! same key from both publishing it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of offering a key to the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// Not seen before (or force-refresh): proceed to map and publish.
    Fresh,
    /// Already accepted in this process, or being published right now: skip.
    Duplicate,
}

/// Shared, process-lifetime dedup set.
///
/// Cloning is cheap and all clones share the same underlying sets.
#[derive(Clone, Default)]
pub struct DedupSet {
    inner: Arc<Mutex<Sets>>,
}

#[derive(Default)]
struct Sets {
    /// Keys whose events have been published.
    seen: HashSet<String>,
    /// Keys reserved by a run that has not finished publishing yet.
    in_flight: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a key for acceptance.
    ///
    /// With `force_refresh` the sets are neither consulted nor mutated: the
    /// caller always proceeds, and the key is still committed after a
    /// successful publish.
    ///
    /// Without it, a [`Fresh`] decision reserves the key until the caller
    /// either [`commit`]s or [`release`]s it.
    ///
    /// [`Fresh`]: DedupDecision::Fresh
    /// [`commit`]: DedupSet::commit
    /// [`release`]: DedupSet::release
    pub fn begin(&self, key: &str, force_refresh: bool) -> DedupDecision {
        if force_refresh {
            return DedupDecision::Fresh;
        }
        let mut sets = self.lock();
        if sets.seen.contains(key) || sets.in_flight.contains(key) {
            return DedupDecision::Duplicate;
        }
        sets.in_flight.insert(key.to_owned());
        DedupDecision::Fresh
    }

    /// Record a successful publish: the key is now seen for the process
    /// lifetime.
    pub fn commit(&self, key: &str) {
        let mut sets = self.lock();
        sets.in_flight.remove(key);
        sets.seen.insert(key.to_owned());
    }

    /// Drop an in-flight reservation after a failed publish, leaving the
    /// key acceptable on a later run.
    pub fn release(&self, key: &str) {
        self.lock().in_flight.remove(key);
    }

    /// Whether the key has been committed.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().seen.contains(key)
    }

    /// Number of committed keys.
    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    /// Whether no key has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.lock().seen.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Sets> {
        // The sets stay consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
