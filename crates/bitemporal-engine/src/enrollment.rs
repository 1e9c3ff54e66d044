//! Per-entity-type enrollment tracker for one transaction.
//!
//! Holds the lazily created containers and the read-only readers of each
//! committed snapshot. Readers are recorded by handle only; the tracker
//! never owns the business objects.

use std::collections::{HashMap, HashSet};

use bitemporal_core::models::{EntityKey, ObjectHandle, SnapshotId, TemporalStyle};
use bitemporal_core::traits::{IDatedCache, ITransaction};
use tracing::debug;

use crate::container::{new_container, TemporalContainer};
use crate::object::DatedObject;

pub struct EnrollmentTracker {
    entity_type: String,
    style: TemporalStyle,
    containers: HashMap<EntityKey, Box<dyn TemporalContainer>>,
    read_only: HashMap<SnapshotId, HashSet<ObjectHandle>>,
    write_enrolled: HashSet<ObjectHandle>,
}

impl EnrollmentTracker {
    pub fn new(entity_type: &str, style: TemporalStyle) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            style,
            containers: HashMap::new(),
            read_only: HashMap::new(),
            write_enrolled: HashSet::new(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn style(&self) -> TemporalStyle {
        self.style
    }

    /// The container for `key`, created on first access.
    pub fn container_for(&mut self, key: &EntityKey) -> &mut dyn TemporalContainer {
        let style = self.style;
        self.containers
            .entry(key.clone())
            .or_insert_with(|| new_container(style, key.clone()))
            .as_mut()
    }

    pub fn container(&self, key: &EntityKey) -> Option<&dyn TemporalContainer> {
        self.containers.get(key).map(|c| c.as_ref())
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Records `object` as a read-only reader of its committed snapshot.
    /// Objects without committed data, and objects already enrolled for
    /// write, are not tracked.
    pub fn enroll_read_only(&mut self, object: &DatedObject) {
        if self.write_enrolled.contains(&object.handle()) {
            return;
        }
        let Some(committed) = object.committed_data() else {
            return;
        };
        let identity = committed.identity();
        debug!(
            entity = %self.entity_type,
            key = %identity.key,
            handle = %object.handle(),
            "read-only enrollment"
        );
        self.read_only
            .entry(identity)
            .or_default()
            .insert(object.handle());
    }

    pub fn readers_of(&self, identity: &SnapshotId) -> Vec<ObjectHandle> {
        self.read_only
            .get(identity)
            .map(|readers| readers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_write_enrolled(&self, handle: ObjectHandle) -> bool {
        self.write_enrolled.contains(&handle)
    }

    /// Write-enrolls `object`. Every read-only reader of the same committed
    /// snapshot is promoted with it, and the snapshot is registered with the
    /// container. Returns the promoted handles, `object` included.
    pub fn enroll_in_write(
        &mut self,
        tx: &mut dyn ITransaction,
        object: &DatedObject,
    ) -> Vec<ObjectHandle> {
        let mut promoted = vec![object.handle()];
        if let Some(committed) = object.committed_data() {
            if let Some(readers) = self.read_only.remove(&committed.identity()) {
                promoted.extend(readers.into_iter().filter(|h| *h != object.handle()));
            }
            self.container_for(object.key())
                .enroll_in_write(tx, Some(committed));
        }
        self.write_enrolled.extend(promoted.iter().copied());
        if promoted.len() > 1 {
            debug!(
                entity = %self.entity_type,
                key = %object.key(),
                promoted = promoted.len(),
                "promoted read-only readers to write"
            );
        }
        promoted
    }

    /// Undoes a write enrollment whose edit failed. The handles leave the
    /// write set and the readers go back to the snapshot they read.
    pub fn abandon_write(&mut self, object: &DatedObject, promoted: &[ObjectHandle]) {
        for handle in promoted {
            self.write_enrolled.remove(handle);
        }
        let Some(committed) = object.committed_data() else {
            return;
        };
        let readers: Vec<ObjectHandle> = promoted
            .iter()
            .copied()
            .filter(|h| *h != object.handle())
            .collect();
        if !readers.is_empty() {
            self.read_only
                .entry(committed.identity())
                .or_default()
                .extend(readers);
        }
    }

    /// Buffered operations of every container reached the log.
    pub fn flush(&mut self) {
        for container in self.containers.values_mut() {
            container.flush();
        }
    }

    /// Settles every container against the shared cache and discards them.
    /// Returns the number of settled wrappers.
    pub fn commit(&mut self, cache: &dyn IDatedCache) -> usize {
        let settled: usize = self
            .containers
            .values_mut()
            .map(|container| container.commit(cache))
            .sum();
        self.clear();
        settled
    }

    /// Discards all transaction-local state without touching the cache.
    pub fn rollback(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.containers.clear();
        self.read_only.clear();
        self.write_enrolled.clear();
    }
}
