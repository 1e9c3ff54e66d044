//! Checked mutation of snapshots already shared with the value-keyed cache.

use std::ops::{Deref, DerefMut};

use bitemporal_core::models::Snapshot;
use bitemporal_core::traits::IDatedCache;

/// Removes the snapshot from the cache on creation and puts it back on drop,
/// so the cache never indexes a half-edited row.
pub struct CacheEdit<'c, 'd> {
    cache: &'c dyn IDatedCache,
    data: &'d mut Snapshot,
}

impl<'c, 'd> CacheEdit<'c, 'd> {
    pub fn begin(cache: &'c dyn IDatedCache, data: &'d mut Snapshot) -> Self {
        cache.remove_dated_data(data);
        Self { cache, data }
    }
}

impl Deref for CacheEdit<'_, '_> {
    type Target = Snapshot;

    fn deref(&self) -> &Snapshot {
        self.data
    }
}

impl DerefMut for CacheEdit<'_, '_> {
    fn deref_mut(&mut self) -> &mut Snapshot {
        self.data
    }
}

impl Drop for CacheEdit<'_, '_> {
    fn drop(&mut self) {
        self.cache.put_dated_data(self.data);
    }
}

/// Runs `edit` between a remove and a put of `data`.
pub fn reindex<R>(
    cache: &dyn IDatedCache,
    data: &mut Snapshot,
    edit: impl FnOnce(&mut Snapshot) -> R,
) -> R {
    let mut guard = CacheEdit::begin(cache, data);
    edit(&mut guard)
}
