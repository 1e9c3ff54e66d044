use crate::models::{EntityKey, Snapshot};

/// The cache/index shared by all transactions.
///
/// Entries are keyed by field value, so a snapshot already handed to the
/// cache must be removed before any of its date bounds change and put back
/// afterwards. Implementations synchronise internally.
pub trait IDatedCache: Send + Sync {
    /// Index the business object whose current data is `data`.
    fn put(&self, data: &Snapshot);
    fn put_dated_data(&self, data: &Snapshot);
    fn remove_dated_data(&self, data: &Snapshot);
    /// Every cached row of `key`, regardless of its dates.
    fn get_dated_data_ignoring_dates(&self, key: &EntityKey) -> Vec<Snapshot>;
}
