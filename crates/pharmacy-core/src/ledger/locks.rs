//! Per-medication mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lazily populated table of one lock per medication id.
///
/// The locks guard no data: stock lives in the store, so a panic while a
/// lock was held leaves nothing half-written and poisoning is ignored.
#[derive(Debug, Default)]
pub struct LockTable {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, medication_id: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(medication_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the locks of every listed medication.
    ///
    /// Locks are taken in ascending id order, duplicates collapsed, so
    /// overlapping callers cannot deadlock.
    pub fn with_locked<'a, I, R>(&self, medication_ids: I, f: impl FnOnce() -> R) -> R
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids: Vec<&str> = medication_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let slots: Vec<Arc<Mutex<()>>> = ids.iter().map(|id| self.slot(id)).collect();
        let _guards: Vec<MutexGuard<'_, ()>> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        f()
    }

    /// Drop the lock entry of a deleted medication.
    pub fn forget(&self, medication_id: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(medication_id);
    }
}
