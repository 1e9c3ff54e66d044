use bitemporal_core::errors::{BitemporalError, BitemporalResult};
use bitemporal_core::models::{
    DateRange, EntityKey, Snapshot, TemporalStyle, Timestamp, TxObject,
};
use bitemporal_core::traits::ITransaction;

use super::{ContainerCore, TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::object::DatedObject;

/// Processing axis only: at most one active snapshot, and a flag instead of
/// a range ledger.
#[derive(Debug)]
pub struct AuditOnlyContainer {
    core: ContainerCore,
    active: Option<TxObjectId>,
    inactivated: bool,
}

impl AuditOnlyContainer {
    pub fn new(key: EntityKey) -> Self {
        Self {
            core: ContainerCore::new(key),
            active: None,
            inactivated: false,
        }
    }

    pub fn is_inactivated(&self) -> bool {
        self.inactivated
    }

    fn retire(&mut self) {
        self.active = None;
        self.inactivated = true;
    }
}

impl TemporalContainer for AuditOnlyContainer {
    fn style(&self) -> TemporalStyle {
        TemporalStyle::AuditOnly
    }

    fn core(&self) -> &ContainerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ContainerCore {
        &mut self.core
    }

    fn get_active_data_for(&self, _business_date: Option<Timestamp>) -> Option<&Snapshot> {
        self.active.and_then(|id| self.core.data_of(id))
    }

    fn get_active_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot> {
        if data.is_current() {
            self.get_active_data_for(None)
        } else {
            None
        }
    }

    fn get_active_or_inactive_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot> {
        self.get_active_data_from_data(data)
    }

    fn is_inactivated_or_split(&self, _business_date: Option<Timestamp>) -> bool {
        self.inactivated
    }

    fn get_objects_for_range(
        &mut self,
        ctx: &mut TxContext<'_>,
        object: &DatedObject,
        _range: DateRange,
    ) -> BitemporalResult<Vec<TxObjectId>> {
        let lookup = self
            .get_active_data_for(None)
            .or(object.current_data())
            .cloned();
        if let Some(id) = lookup.as_ref().and_then(|d| self.get_object_for_tx(d)) {
            return Ok(vec![id]);
        }
        let current = object.current_data().cloned().ok_or_else(|| {
            BitemporalError::InvariantViolation(format!(
                "no committed data to enroll for {}",
                object.key()
            ))
        })?;
        let id = self.alloc(TxObject::committed(current));
        self.add_object_for_tx(ctx.tx, id);
        Ok(vec![id])
    }

    fn add_committed_data(&mut self, tx: &mut dyn ITransaction, data: Snapshot) {
        if self.core.has_committed(&data) {
            return;
        }
        self.core.push_committed(data.clone());
        if data.is_current() {
            let id = self.alloc(TxObject::committed(data));
            self.add_object_for_tx(tx, id);
        }
    }

    fn add_active_data(&mut self, id: TxObjectId) {
        self.active = Some(id);
    }

    fn add_object_for_tx(&mut self, tx: &mut dyn ITransaction, id: TxObjectId) {
        self.core.enlist(id);
        let Some(object) = self.core.get(id).ok() else {
            return;
        };
        tx.enroll_object(object);
        if object.data_for_read().is_current() {
            self.active = Some(id);
            self.inactivated = false;
        }
    }

    fn update_in_place_data(&mut self, _id: TxObjectId) -> BitemporalResult<()> {
        Err(BitemporalError::unsupported(
            "update_in_place_data",
            "audit-only containers never rewrite their active snapshot",
        ))
    }

    fn void_data(&mut self, id: TxObjectId) {
        if self.core.data_of(id).is_some_and(Snapshot::is_current) {
            self.retire();
        }
    }

    fn inactivate_object(&mut self, id: TxObjectId) {
        self.core.delist(id);
        self.retire();
    }

    fn delete_in_tx_object(&mut self, _id: TxObjectId) {
        self.retire();
    }

    fn clear_all_objects(&mut self) {
        self.core.clear_in_tx();
        self.retire();
    }

    fn check_inactivated(&self, tx: &dyn ITransaction, object: &DatedObject) -> BitemporalResult<()> {
        if self.inactivated && tx.is_in_future(object.processing_date()) {
            return Err(BitemporalError::deleted(
                object.key().to_string(),
                "Cannot access deleted object",
            ));
        }
        Ok(())
    }

    fn check_inactivated_for_delete(&self, _object: &DatedObject) -> BitemporalResult<()> {
        Ok(())
    }
}
