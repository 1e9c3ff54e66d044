//! Temporal containers: per-(transaction, identity) owners of snapshot
//! lists, the range ledger and in-transaction wrappers.

mod audit_only;
mod business_date;

use std::fmt;

use bitemporal_core::errors::{BitemporalError, BitemporalResult};
use bitemporal_core::models::{
    DateRange, EntityKey, Snapshot, TemporalStyle, Timestamp, TxObject, WrapperState,
};
use bitemporal_core::traits::{IDatedCache, ITransaction};

pub use audit_only::AuditOnlyContainer;
pub use business_date::BusinessDateContainer;

use crate::context::TxContext;
use crate::object::DatedObject;

/// Index of a wrapper in its container's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxObjectId(usize);

impl fmt::Display for TxObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State shared by every container variant: the wrapper arena, the
/// enrolled-wrapper list and the committed snapshots seen so far.
#[derive(Debug)]
pub struct ContainerCore {
    key: EntityKey,
    objects: Vec<TxObject>,
    in_tx: Vec<TxObjectId>,
    committed: Vec<Snapshot>,
}

impl ContainerCore {
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            objects: Vec::new(),
            in_tx: Vec::new(),
            committed: Vec::new(),
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn alloc(&mut self, object: TxObject) -> TxObjectId {
        self.objects.push(object);
        TxObjectId(self.objects.len() - 1)
    }

    pub fn get(&self, id: TxObjectId) -> BitemporalResult<&TxObject> {
        self.objects.get(id.0).ok_or_else(|| self.missing(id))
    }

    pub fn get_mut(&mut self, id: TxObjectId) -> BitemporalResult<&mut TxObject> {
        if id.0 >= self.objects.len() {
            return Err(self.missing(id));
        }
        Ok(&mut self.objects[id.0])
    }

    fn missing(&self, id: TxObjectId) -> BitemporalError {
        BitemporalError::InvariantViolation(format!(
            "wrapper {id} is not owned by the container of {}",
            self.key
        ))
    }

    /// Looks a wrapper up when the id is known to come from this arena.
    pub(crate) fn data_of(&self, id: TxObjectId) -> Option<&Snapshot> {
        self.objects.get(id.0).map(TxObject::data_for_read)
    }

    pub fn in_tx(&self) -> &[TxObjectId] {
        &self.in_tx
    }

    pub fn is_enlisted(&self, id: TxObjectId) -> bool {
        self.in_tx.contains(&id)
    }

    pub fn enlist(&mut self, id: TxObjectId) -> bool {
        if self.is_enlisted(id) {
            return false;
        }
        self.in_tx.push(id);
        true
    }

    pub fn delist(&mut self, id: TxObjectId) {
        self.in_tx.retain(|other| *other != id);
    }

    pub fn clear_in_tx(&mut self) {
        self.in_tx.clear();
    }

    pub fn committed(&self) -> &[Snapshot] {
        &self.committed
    }

    pub fn has_committed(&self, data: &Snapshot) -> bool {
        self.committed.iter().any(|c| c.same_from_dates(data))
    }

    pub fn push_committed(&mut self, data: Snapshot) {
        self.committed.push(data);
    }

    pub fn objects(&self) -> impl Iterator<Item = (TxObjectId, &TxObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (TxObjectId(i), o))
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut TxObject> {
        self.objects.iter_mut()
    }
}

/// Contract shared by the audit-only, non-audited and bitemporal variants.
///
/// Every mutation that takes a snapshot out of "active" records a matching
/// range status so later lookups see the new disposition.
pub trait TemporalContainer: Send + fmt::Debug {
    fn style(&self) -> TemporalStyle;
    fn core(&self) -> &ContainerCore;
    fn core_mut(&mut self) -> &mut ContainerCore;

    fn get_active_data_for(&self, business_date: Option<Timestamp>) -> Option<&Snapshot>;
    fn get_active_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot>;
    fn get_active_or_inactive_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot>;
    fn is_inactivated_or_split(&self, business_date: Option<Timestamp>) -> bool;

    /// Loads `range` if the ledger shows a gap, then returns every enlisted
    /// wrapper intersecting it.
    fn get_objects_for_range(
        &mut self,
        ctx: &mut TxContext<'_>,
        object: &DatedObject,
        range: DateRange,
    ) -> BitemporalResult<Vec<TxObjectId>>;

    fn add_committed_data(&mut self, tx: &mut dyn ITransaction, data: Snapshot);
    fn add_active_data(&mut self, id: TxObjectId);
    fn add_object_for_tx(&mut self, tx: &mut dyn ITransaction, id: TxObjectId);
    /// The wrapper's data was rewritten in place and stays active.
    fn update_in_place_data(&mut self, id: TxObjectId) -> BitemporalResult<()>;
    fn void_data(&mut self, id: TxObjectId);
    fn inactivate_object(&mut self, id: TxObjectId);
    fn delete_in_tx_object(&mut self, id: TxObjectId);
    fn clear_all_objects(&mut self);

    fn check_inactivated(&self, tx: &dyn ITransaction, object: &DatedObject) -> BitemporalResult<()>;
    fn check_inactivated_for_delete(&self, object: &DatedObject) -> BitemporalResult<()>;

    fn key(&self) -> &EntityKey {
        self.core().key()
    }

    fn object(&self, id: TxObjectId) -> BitemporalResult<&TxObject> {
        self.core().get(id)
    }

    fn object_mut(&mut self, id: TxObjectId) -> BitemporalResult<&mut TxObject> {
        self.core_mut().get_mut(id)
    }

    /// Registers a wrapper without enlisting it.
    fn alloc(&mut self, object: TxObject) -> TxObjectId {
        self.core_mut().alloc(object)
    }

    fn in_tx_objects(&self) -> Vec<TxObjectId> {
        self.core().in_tx().to_vec()
    }

    fn get_object_for_tx(&self, data: &Snapshot) -> Option<TxObjectId> {
        let core = self.core();
        core.in_tx()
            .iter()
            .copied()
            .find(|id| core.data_of(*id).is_some_and(|d| d.same_from_dates(data)))
    }

    fn get_committed_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot> {
        self.core()
            .committed()
            .iter()
            .find(|c| c.same_from_dates(data))
    }

    fn get_committed_data_from_dates(
        &self,
        business_date: Option<Timestamp>,
        processing_date: Timestamp,
    ) -> Option<&Snapshot> {
        self.core().committed().iter().find(|c| {
            business_date.map_or(true, |d| c.matches_business_date(d))
                && (!self.style().has_processing_axis() || c.matches_processing_date(processing_date))
        })
    }

    /// Makes sure the object's committed snapshot is known to the container.
    fn enroll_in_write(&mut self, tx: &mut dyn ITransaction, committed: Option<&Snapshot>) {
        let Some(data) = committed else {
            return;
        };
        if self.core().has_committed(data) || self.get_object_for_tx(data).is_some() {
            return;
        }
        self.add_committed_data(tx, data.clone());
    }

    /// Entry point for brand-new data: a ToBeInserted wrapper, active at once.
    fn make_uninserted_data_active_and_create_object(
        &mut self,
        tx: &mut dyn ITransaction,
        data: Snapshot,
    ) -> TxObjectId {
        let id = self.alloc(TxObject::to_be_inserted(data));
        self.add_object_for_tx(tx, id);
        id
    }

    /// Buffered operations reached the log.
    fn flush(&mut self) {
        for object in self.core_mut().objects_mut() {
            match object.state() {
                WrapperState::ToBeInserted => object.mark_inserted(),
                WrapperState::ToBeUpdated => object.mark_updated(),
                _ => {}
            }
        }
    }

    /// Settles every touched wrapper. Returns how many were settled.
    fn commit(&mut self, cache: &dyn IDatedCache) -> usize {
        let mut settled = 0;
        for object in self.core_mut().objects_mut() {
            if object.is_deleted() {
                if let Some(committed) = object.committed_data() {
                    cache.remove_dated_data(committed);
                }
                settled += 1;
            } else if object.has_written() {
                object.handle_commit();
                settled += 1;
            }
        }
        settled
    }
}

/// Fresh container for `key` in the given style.
pub fn new_container(style: TemporalStyle, key: EntityKey) -> Box<dyn TemporalContainer> {
    match style {
        TemporalStyle::AuditOnly => Box::new(AuditOnlyContainer::new(key)),
        TemporalStyle::NonAudited => Box::new(BusinessDateContainer::non_audited(key)),
        TemporalStyle::Bitemporal => Box::new(BusinessDateContainer::bitemporal(key)),
    }
}
