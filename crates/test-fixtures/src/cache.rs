use bitemporal_core::models::{EntityKey, Snapshot};
use bitemporal_core::traits::IDatedCache;
use dashmap::DashMap;

/// Value-keyed cache: a row is found again only if every date bound still
/// matches, the way an index over field values behaves.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    rows: DashMap<EntityKey, Vec<Snapshot>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, rows: impl IntoIterator<Item = Snapshot>) {
        for row in rows {
            self.put_dated_data(&row);
        }
    }

    /// Rows of `key` that are still the current processing-time view.
    pub fn current_rows(&self, key: &EntityKey) -> Vec<Snapshot> {
        let mut rows: Vec<Snapshot> = self
            .get_dated_data_ignoring_dates(key)
            .into_iter()
            .filter(Snapshot::is_current)
            .collect();
        rows.sort_by_key(Snapshot::business_start);
        rows
    }

    pub fn keys(&self) -> Vec<EntityKey> {
        self.rows.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IDatedCache for InMemoryCache {
    fn put(&self, data: &Snapshot) {
        self.put_dated_data(data);
    }

    fn put_dated_data(&self, data: &Snapshot) {
        let mut rows = self.rows.entry(data.key.clone()).or_default();
        match rows.iter_mut().find(|row| row.same_row(data)) {
            Some(row) => *row = data.clone(),
            None => rows.push(data.clone()),
        }
    }

    fn remove_dated_data(&self, data: &Snapshot) {
        if let Some(mut rows) = self.rows.get_mut(&data.key) {
            rows.retain(|row| !row.same_row(data));
        }
    }

    fn get_dated_data_ignoring_dates(&self, key: &EntityKey) -> Vec<Snapshot> {
        self.rows
            .get(key)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }
}
