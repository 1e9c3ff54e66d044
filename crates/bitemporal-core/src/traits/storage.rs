use crate::errors::StorageError;
use crate::models::{DateRange, EntityKey, Snapshot};

/// Durable store consulted when a container lacks data for a business range.
pub trait IStorage: Send + Sync {
    /// Every current snapshot of `key` whose business range intersects `range`.
    fn load_range(&self, key: &EntityKey, range: DateRange) -> Result<Vec<Snapshot>, StorageError>;
}
