use std::sync::atomic::{AtomicUsize, Ordering};

use bitemporal_core::errors::StorageError;
use bitemporal_core::models::{DateRange, EntityKey, Snapshot};
use bitemporal_core::traits::{IDatedCache, IStorage};
use dashmap::DashMap;

use crate::cache::InMemoryCache;

/// Storage loader backed by a map of rows. Counts loads so tests can assert
/// that a covered range is never fetched twice.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    rows: DashMap<EntityKey, Vec<Snapshot>>,
    loads: AtomicUsize,
    fail_next: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, rows: impl IntoIterator<Item = Snapshot>) {
        for row in rows {
            self.rows.entry(row.key.clone()).or_default().push(row);
        }
    }

    /// Replaces the stored rows with everything the cache holds, as if the
    /// committed transaction had been written through.
    pub fn sync_from(&self, cache: &InMemoryCache) {
        self.rows.clear();
        for key in cache.keys() {
            let rows = cache.get_dated_data_ignoring_dates(&key);
            if !rows.is_empty() {
                self.rows.insert(key, rows);
            }
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The next `count` loads fail with a transient error.
    pub fn fail_next_loads(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn rows(&self, key: &EntityKey) -> Vec<Snapshot> {
        self.rows
            .get(key)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }
}

impl IStorage for InMemoryStorage {
    fn load_range(&self, key: &EntityKey, range: DateRange) -> Result<Vec<Snapshot>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let pending = self.fail_next.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next.store(pending - 1, Ordering::SeqCst);
            return Err(StorageError::Transient(format!("load of {key} over {range} failed")));
        }
        Ok(self
            .rows(key)
            .into_iter()
            .filter(|row| row.is_current() && row.business_range().intersects(&range))
            .collect())
    }
}
