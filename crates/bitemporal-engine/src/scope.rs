//! TransactionScope: the engine's entry point for one transaction.
//!
//! Owns the per-entity-type enrollment trackers and routes every read and
//! edit through the behavior table before it reaches a director.

use std::collections::HashMap;

use bitemporal_core::config::TemporalConfig;
use bitemporal_core::errors::BitemporalResult;
use bitemporal_core::models::{
    AttributeUpdate, EntityKey, PersistenceState, Snapshot, TemporalStyle, Timestamp, TxId,
    TxRelationship,
};
use bitemporal_core::traits::{IDatedCache, IStorage, ITransaction};
use tracing::{debug, info};

use crate::behavior::{EditRoute, EnrollIntent};
use crate::container::TemporalContainer;
use crate::context::TxContext;
use crate::director::{director_for, TemporalEdit};
use crate::enrollment::EnrollmentTracker;
use crate::object::DatedObject;

pub struct TransactionScope<'a> {
    tx: &'a mut dyn ITransaction,
    cache: &'a dyn IDatedCache,
    storage: &'a dyn IStorage,
    config: &'a TemporalConfig,
    trackers: HashMap<String, EnrollmentTracker>,
}

impl<'a> TransactionScope<'a> {
    pub fn begin(
        tx: &'a mut dyn ITransaction,
        cache: &'a dyn IDatedCache,
        storage: &'a dyn IStorage,
        config: &'a TemporalConfig,
    ) -> Self {
        debug!(tx = %tx.id(), start = %tx.processing_start_time(), "transaction scope opened");
        Self {
            tx,
            cache,
            storage,
            config,
            trackers: HashMap::new(),
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.tx.id()
    }

    /// The tracker for `entity_type`, created on first access.
    pub fn tracker(&mut self, entity_type: &str, style: TemporalStyle) -> &mut EnrollmentTracker {
        self.trackers
            .entry(entity_type.to_string())
            .or_insert_with(|| EnrollmentTracker::new(entity_type, style))
    }

    /// The container already holding `key`, if the transaction has touched it.
    pub fn container(&self, entity_type: &str, key: &EntityKey) -> Option<&dyn TemporalContainer> {
        self.trackers
            .get(entity_type)
            .and_then(|tracker| tracker.container(key))
    }

    /// Reads `object` as the transaction sees it. A persisted object joining
    /// the transaction is enrolled read-only against its committed row.
    pub fn read(&mut self, object: &DatedObject) -> BitemporalResult<Snapshot> {
        let relationship = object.relationship_to(self.tx.id());
        let mut behavior = object.behavior_for(relationship);
        if relationship == TxRelationship::EnrollingNow {
            behavior = behavior.transition(object, EnrollIntent::Read)?;
            if object.persistence() == PersistenceState::Persisted {
                self.tracker(object.entity_type(), object.style())
                    .enroll_read_only(object);
            }
        }
        let container = self.container(object.entity_type(), object.key());
        if let Some(container) = container {
            container.check_inactivated(&*self.tx, object)?;
        }
        behavior.current_data_for_read(object, container)
    }

    /// Routes `edit` for `object` and executes it.
    pub fn apply(&mut self, object: &mut DatedObject, edit: TemporalEdit) -> BitemporalResult<()> {
        let tx_id = self.tx.id();
        let kind = edit.kind();
        let relationship = object.relationship_to(tx_id);
        let mut behavior = object.behavior_for(relationship);
        if relationship == TxRelationship::EnrollingNow {
            behavior = behavior.transition(object, kind.intent())?;
        }

        match behavior.route(object, kind)? {
            EditRoute::Director => {
                let tracker = self
                    .trackers
                    .entry(object.entity_type().to_string())
                    .or_insert_with(|| EnrollmentTracker::new(object.entity_type(), object.style()));
                let first_write = !tracker.is_write_enrolled(object.handle());
                let promoted = tracker.enroll_in_write(&mut *self.tx, object);
                let mut ctx = TxContext::new(&mut *self.tx, self.cache, self.storage, self.config);
                let result = dispatch(&mut ctx, tracker.container_for(object.key()), object, &edit);
                match result {
                    Ok(()) => {
                        object.set_enrolled(Some(tx_id));
                        Ok(())
                    }
                    Err(err) => {
                        if first_write {
                            tracker.abandon_write(object, &promoted);
                        }
                        debug!(tx = %tx_id, edit = kind.name(), error = %err, "edit failed");
                        Err(err)
                    }
                }
            }
            EditRoute::LocalData => {
                let data = behavior.current_data_for_write(object, None)?;
                if let Some(update) = edit.attribute_update() {
                    update.apply(data)?;
                }
                Ok(())
            }
            EditRoute::DetachedTerminate => {
                object.set_persistence(PersistenceState::Deleted);
                Ok(())
            }
        }
    }

    pub fn insert(&mut self, object: &mut DatedObject) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::Insert)
    }

    pub fn insert_until(&mut self, object: &mut DatedObject, until: Timestamp) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::InsertUntil { until })
    }

    pub fn insert_with_increment(&mut self, object: &mut DatedObject) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::InsertWithIncrement)
    }

    pub fn insert_with_increment_until(
        &mut self,
        object: &mut DatedObject,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::InsertWithIncrementUntil { until })
    }

    pub fn insert_for_recovery(&mut self, object: &mut DatedObject) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::InsertForRecovery)
    }

    pub fn update(&mut self, object: &mut DatedObject, update: AttributeUpdate) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::Update(update))
    }

    pub fn update_until(
        &mut self,
        object: &mut DatedObject,
        update: AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::UpdateUntil { update, until })
    }

    pub fn in_place_update(
        &mut self,
        object: &mut DatedObject,
        update: AttributeUpdate,
    ) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::InPlaceUpdate(update))
    }

    pub fn increment(&mut self, object: &mut DatedObject, update: AttributeUpdate) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::Increment(update))
    }

    pub fn increment_until(
        &mut self,
        object: &mut DatedObject,
        update: AttributeUpdate,
        until: Timestamp,
    ) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::IncrementUntil { update, until })
    }

    pub fn terminate(&mut self, object: &mut DatedObject) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::Terminate)
    }

    pub fn terminate_until(&mut self, object: &mut DatedObject, until: Timestamp) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::TerminateUntil { until })
    }

    pub fn purge(&mut self, object: &mut DatedObject) -> BitemporalResult<()> {
        self.apply(object, TemporalEdit::Purge)
    }

    pub fn inactivate_for_archiving(
        &mut self,
        object: &mut DatedObject,
        processing_to: Timestamp,
        business_to: Option<Timestamp>,
    ) -> BitemporalResult<()> {
        self.apply(
            object,
            TemporalEdit::InactivateForArchiving {
                processing_to,
                business_to,
            },
        )
    }

    /// Pushes buffered inserts of every container to the transaction log.
    pub fn flush(&mut self) {
        for tracker in self.trackers.values_mut() {
            tracker.flush();
        }
    }

    /// Flushes, then settles every container against the shared cache.
    /// Returns the number of settled wrappers.
    pub fn commit(mut self) -> usize {
        self.flush();
        let cache = self.cache;
        let settled: usize = self
            .trackers
            .values_mut()
            .map(|tracker| tracker.commit(cache))
            .sum();
        info!(tx = %self.tx.id(), settled, "transaction committed");
        settled
    }

    /// Discards every container without writing to the shared cache.
    pub fn rollback(mut self) {
        let trackers = self.trackers.len();
        for tracker in self.trackers.values_mut() {
            tracker.rollback();
        }
        info!(tx = %self.tx.id(), trackers, "transaction rolled back");
    }
}

/// Runs the pre-edit checks for `edit`, then hands it to the director for
/// the object's style.
fn dispatch(
    ctx: &mut TxContext<'_>,
    container: &mut dyn TemporalContainer,
    object: &mut DatedObject,
    edit: &TemporalEdit,
) -> BitemporalResult<()> {
    let kind = edit.kind();
    match kind.intent() {
        EnrollIntent::Delete => container.check_inactivated_for_delete(object)?,
        // A write at a terminated date has no segment to act on.
        EnrollIntent::Write if !kind.is_insert() => {
            object.resolve_tx_data(&*container)?;
        }
        _ => {}
    }
    debug!(
        tx = %ctx.tx.id(),
        edit = kind.name(),
        object = %object.describe(),
        "dispatching edit"
    );
    edit.execute(director_for(object.style()), ctx, container, object)
}
