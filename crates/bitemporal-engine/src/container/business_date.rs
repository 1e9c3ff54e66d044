use bitemporal_core::errors::{BitemporalError, BitemporalResult};
use bitemporal_core::models::{
    DateRange, EntityKey, RangeStatusKind, Snapshot, TemporalStyle, Timestamp, TxObject,
};
use bitemporal_core::traits::ITransaction;
use tracing::debug;

use super::{ContainerCore, TemporalContainer, TxObjectId};
use crate::context::TxContext;
use crate::ledger::RangeLedger;
use crate::object::DatedObject;

/// Container for entities with a business-date axis, with or without the
/// processing axis.
#[derive(Debug)]
pub struct BusinessDateContainer {
    core: ContainerCore,
    style: TemporalStyle,
    active: Vec<TxObjectId>,
    inactive: Vec<TxObjectId>,
    ledger: RangeLedger,
}

impl BusinessDateContainer {
    pub fn non_audited(key: EntityKey) -> Self {
        Self::with_style(key, TemporalStyle::NonAudited)
    }

    pub fn bitemporal(key: EntityKey) -> Self {
        Self::with_style(key, TemporalStyle::Bitemporal)
    }

    fn with_style(key: EntityKey, style: TemporalStyle) -> Self {
        Self {
            core: ContainerCore::new(key),
            style,
            active: Vec::new(),
            inactive: Vec::new(),
            ledger: RangeLedger::new(),
        }
    }

    pub fn ledger(&self) -> &RangeLedger {
        &self.ledger
    }

    pub fn active_objects(&self) -> &[TxObjectId] {
        &self.active
    }

    pub fn inactive_objects(&self) -> &[TxObjectId] {
        &self.inactive
    }

    pub fn set_infinite_range(&mut self) {
        self.ledger.set_infinite_range();
    }

    fn has_processing_axis(&self) -> bool {
        self.style.has_processing_axis()
    }

    /// Without a processing axis every snapshot is current.
    fn is_current(&self, data: &Snapshot) -> bool {
        !self.has_processing_axis() || data.is_current()
    }

    fn remove_active(&mut self, id: TxObjectId) {
        self.active.retain(|other| *other != id);
    }

    fn record(&mut self, id: TxObjectId, status: RangeStatusKind) -> Option<DateRange> {
        let range = self.core.data_of(id)?.business_range();
        self.ledger.record(range, status);
        Some(range)
    }

    fn find_in<'a>(&'a self, ids: &'a [TxObjectId], data: &Snapshot) -> Option<&'a Snapshot> {
        ids.iter()
            .rev()
            .filter_map(|id| self.core.data_of(*id))
            .find(|d| d.same_from_dates(data))
    }
}

impl TemporalContainer for BusinessDateContainer {
    fn style(&self) -> TemporalStyle {
        self.style
    }

    fn core(&self) -> &ContainerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ContainerCore {
        &mut self.core
    }

    fn get_active_data_for(&self, business_date: Option<Timestamp>) -> Option<&Snapshot> {
        let date = business_date?;
        self.active
            .iter()
            .rev()
            .filter_map(|id| self.core.data_of(*id))
            .find(|d| d.matches_business_date(date) && self.is_current(d))
    }

    fn get_active_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot> {
        self.find_in(&self.active, data)
    }

    fn get_active_or_inactive_data_from_data(&self, data: &Snapshot) -> Option<&Snapshot> {
        self.find_in(&self.active, data)
            .or_else(|| self.find_in(&self.inactive, data))
    }

    fn is_inactivated_or_split(&self, business_date: Option<Timestamp>) -> bool {
        business_date.is_some_and(|d| self.ledger.is_inactivated_or_split(d))
    }

    fn get_objects_for_range(
        &mut self,
        ctx: &mut TxContext<'_>,
        _object: &DatedObject,
        range: DateRange,
    ) -> BitemporalResult<Vec<TxObjectId>> {
        if !self.ledger.have_complete_range(range) {
            let key = self.core.key().clone();
            debug!(key = %key, range = %range, "loading business range from storage");
            let loaded = ctx.storage.load_range(&key, range)?;
            self.ledger.stitch(range);
            for data in loaded {
                self.add_committed_data(ctx.tx, data);
            }
        }
        Ok(self
            .core
            .in_tx()
            .iter()
            .copied()
            .filter(|id| {
                self.core
                    .data_of(*id)
                    .is_some_and(|d| d.business_range().intersects(&range))
            })
            .collect())
    }

    fn add_committed_data(&mut self, tx: &mut dyn ITransaction, data: Snapshot) {
        if self.core.has_committed(&data) {
            return;
        }
        let range = data.business_range();
        self.core.push_committed(data.clone());
        self.ledger.record(range, RangeStatusKind::Committed);
        self.ledger.stitch(range);
        if !self.is_current(&data) {
            return;
        }
        let id = self.alloc(TxObject::committed(data));
        self.core.enlist(id);
        self.active.push(id);
        if let Ok(object) = self.core.get(id) {
            tx.enroll_object(object);
        }
    }

    fn add_active_data(&mut self, id: TxObjectId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
        if let Some(range) = self.record(id, RangeStatusKind::Active) {
            self.ledger.stitch(range);
        }
    }

    fn add_object_for_tx(&mut self, tx: &mut dyn ITransaction, id: TxObjectId) {
        self.core.enlist(id);
        let Ok(object) = self.core.get(id) else {
            return;
        };
        tx.enroll_object(object);
        if self.is_current(object.data_for_read()) {
            self.add_active_data(id);
        }
    }

    fn update_in_place_data(&mut self, id: TxObjectId) -> BitemporalResult<()> {
        if self.core.data_of(id).is_none() {
            return Err(BitemporalError::InvariantViolation(format!(
                "in-place update of unknown wrapper {id} for {}",
                self.core.key()
            )));
        }
        if !self.active.contains(&id) {
            self.active.push(id);
        }
        self.record(id, RangeStatusKind::Active);
        Ok(())
    }

    fn void_data(&mut self, id: TxObjectId) {
        if self.core.data_of(id).is_some_and(|d| self.is_current(d)) {
            self.remove_active(id);
            self.record(id, RangeStatusKind::Void);
        }
    }

    fn inactivate_object(&mut self, id: TxObjectId) {
        self.core.delist(id);
        self.remove_active(id);
        self.record(id, RangeStatusKind::Inactive);
        if !self.inactive.contains(&id) {
            self.inactive.push(id);
        }
    }

    fn delete_in_tx_object(&mut self, id: TxObjectId) {
        self.remove_active(id);
        self.record(id, RangeStatusKind::Void);
        self.core.delist(id);
    }

    fn clear_all_objects(&mut self) {
        self.active.clear();
        self.ledger.reset_to_void();
        self.core.clear_in_tx();
    }

    fn check_inactivated(&self, tx: &dyn ITransaction, object: &DatedObject) -> BitemporalResult<()> {
        if self.has_processing_axis() && !tx.is_in_future(object.processing_date()) {
            return Ok(());
        }
        self.check_ledger(object)
    }

    fn check_inactivated_for_delete(&self, object: &DatedObject) -> BitemporalResult<()> {
        if self.has_processing_axis() {
            return Ok(());
        }
        self.check_ledger(object)
    }
}

impl BusinessDateContainer {
    fn check_ledger(&self, object: &DatedObject) -> BitemporalResult<()> {
        match object.business_date() {
            Some(date) if self.ledger.is_inactivated_or_split(date) => {
                Err(BitemporalError::DeletedObject {
                    key: object.key().to_string(),
                    business_date: Some(date.to_rfc3339()),
                    message: "Cannot access deleted object".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
