//! DatedObject: the business object the enclosing object layer hands to the
//! engine.

use bitemporal_core::errors::{BitemporalError, BitemporalResult, TemporalError};
use bitemporal_core::models::{
    infinity, is_infinity, EntityKey, ObjectHandle, PersistenceState, Snapshot, TemporalStyle,
    Timestamp, TxId, TxRelationship,
};
use bitemporal_core::traits::IDatedCache;

use crate::behavior::Behavior;
use crate::container::TemporalContainer;

#[derive(Debug, Clone)]
pub struct DatedObject {
    handle: ObjectHandle,
    entity_type: String,
    style: TemporalStyle,
    key: EntityKey,
    business_date: Option<Timestamp>,
    processing_date: Timestamp,
    persistence: PersistenceState,
    enrolled_in: Option<TxId>,
    /// Committed (non-transactional) data, or the allocated data of an
    /// in-memory object.
    data: Option<Snapshot>,
    /// Working copy installed by a transactional write.
    tx_data: Option<Snapshot>,
    /// `data` is a committed row rather than allocated or inserted data.
    from_storage: bool,
}

impl DatedObject {
    fn build(
        entity_type: &str,
        style: TemporalStyle,
        data: Snapshot,
        business_date: Option<Timestamp>,
        persistence: PersistenceState,
    ) -> Self {
        Self {
            handle: ObjectHandle::new(),
            entity_type: entity_type.to_string(),
            style,
            key: data.key.clone(),
            business_date: if style.has_business_axis() {
                business_date
            } else {
                None
            },
            processing_date: infinity(),
            persistence,
            enrolled_in: None,
            data: Some(data),
            tx_data: None,
            from_storage: persistence == PersistenceState::Persisted,
        }
    }

    /// A new object not yet known to storage.
    pub fn in_memory(
        entity_type: &str,
        style: TemporalStyle,
        data: Snapshot,
        business_date: Option<Timestamp>,
    ) -> Self {
        Self::build(entity_type, style, data, business_date, PersistenceState::InMemory)
    }

    /// An object materialised from committed data.
    pub fn persisted(
        entity_type: &str,
        style: TemporalStyle,
        data: Snapshot,
        business_date: Option<Timestamp>,
    ) -> Self {
        Self::build(entity_type, style, data, business_date, PersistenceState::Persisted)
    }

    /// A private copy that can be edited without a transaction.
    pub fn detached(
        entity_type: &str,
        style: TemporalStyle,
        data: Snapshot,
        business_date: Option<Timestamp>,
    ) -> Self {
        Self::build(entity_type, style, data, business_date, PersistenceState::Detached)
    }

    /// Another handle on the same identity, as of `business_date`. It shares
    /// the enrollment and persistence state but has no working copy.
    pub fn at_business_date(&self, business_date: Timestamp) -> Self {
        Self {
            handle: ObjectHandle::new(),
            business_date: self.style.has_business_axis().then_some(business_date),
            tx_data: None,
            ..self.clone()
        }
    }

    /// Views the object as of an earlier processing date.
    pub fn as_of_processing(mut self, processing_date: Timestamp) -> Self {
        self.processing_date = processing_date;
        self
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn style(&self) -> TemporalStyle {
        self.style
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn business_date(&self) -> Option<Timestamp> {
        self.business_date
    }

    pub fn processing_date(&self) -> Timestamp {
        self.processing_date
    }

    pub fn persistence(&self) -> PersistenceState {
        self.persistence
    }

    pub fn enrolled_in(&self) -> Option<TxId> {
        self.enrolled_in
    }

    pub fn current_data(&self) -> Option<&Snapshot> {
        self.data.as_ref()
    }

    pub fn tx_data(&self) -> Option<&Snapshot> {
        self.tx_data.as_ref()
    }

    /// The committed row this object was materialised from, if any.
    pub fn committed_data(&self) -> Option<&Snapshot> {
        self.data.as_ref().filter(|_| self.from_storage)
    }

    pub fn is_current_view(&self) -> bool {
        is_infinity(self.processing_date)
    }

    pub fn require_business_date(&self) -> BitemporalResult<Timestamp> {
        self.business_date.ok_or_else(|| {
            TemporalError::MissingBusinessDate {
                key: self.key.to_string(),
            }
            .into()
        })
    }

    /// Relationship when no transaction is in scope.
    pub fn relationship_without_tx(&self) -> TxRelationship {
        match self.enrolled_in {
            None => TxRelationship::NoTx,
            Some(_) => TxRelationship::ThreadNoTxObjectTx,
        }
    }

    /// Relationship to the transaction `tx` in scope.
    pub fn relationship_to(&self, tx: TxId) -> TxRelationship {
        match self.enrolled_in {
            None => TxRelationship::EnrollingNow,
            Some(id) if id == tx => TxRelationship::SameTx,
            Some(_) => TxRelationship::DifferentTx,
        }
    }

    pub fn behavior_for(&self, relationship: TxRelationship) -> &'static Behavior {
        Behavior::of(self.persistence, relationship)
    }

    /// Reads the object with no transaction in scope.
    pub fn read_without_tx(&self) -> BitemporalResult<Snapshot> {
        self.behavior_for(self.relationship_without_tx())
            .current_data_for_read(self, None)
    }

    /// The snapshot a transactional read should see: the container's active
    /// data at the object's business date, falling back to the object's own
    /// data when the container has not seen it yet.
    pub fn resolve_tx_data(&self, container: &dyn TemporalContainer) -> BitemporalResult<Snapshot> {
        if !self.is_current_view() {
            return self.own_data();
        }
        if let Some(active) = container.get_active_data_for(self.business_date) {
            return Ok(active.clone());
        }
        if container.is_inactivated_or_split(self.business_date) {
            return Err(BitemporalError::DeletedObject {
                key: self.key.to_string(),
                business_date: self.business_date.map(|d| d.to_rfc3339()),
                message: "cannot access deleted/terminated object. Check for call to terminate \
                          multiple times or check for bad chaining"
                    .to_string(),
            });
        }
        self.own_data()
    }

    fn own_data(&self) -> BitemporalResult<Snapshot> {
        self.tx_data
            .as_ref()
            .or(self.data.as_ref())
            .cloned()
            .ok_or_else(|| BitemporalError::deleted(self.key.to_string(), "Cannot access deleted object!"))
    }

    pub(crate) fn set_persistence(&mut self, persistence: PersistenceState) {
        self.persistence = persistence;
    }

    pub(crate) fn set_enrolled(&mut self, tx: Option<TxId>) {
        self.enrolled_in = tx;
    }

    /// Data written by this transaction becomes the object's own view; it is
    /// not a committed row until the transaction commits.
    pub(crate) fn set_current_data(&mut self, data: Snapshot) {
        self.data = Some(data);
        self.from_storage = false;
    }

    pub(crate) fn install_tx_data(&mut self, data: Snapshot) -> &mut Snapshot {
        self.tx_data.insert(data)
    }

    pub(crate) fn clear_tx_data(&mut self) {
        self.tx_data = None;
    }

    pub(crate) fn data_mut_or_allocate(&mut self) -> &mut Snapshot {
        let key = self.key.clone();
        self.data.get_or_insert_with(|| Snapshot::new(key))
    }

    /// The data an insert writes: the working copy if one was installed,
    /// else the object's own data.
    pub(crate) fn data_for_insert(&self) -> BitemporalResult<Snapshot> {
        self.tx_data
            .as_ref()
            .or(self.data.as_ref())
            .cloned()
            .ok_or_else(|| {
                TemporalError::NothingToInsert {
                    key: self.key.to_string(),
                }
                .into()
            })
    }

    /// Re-materialises the object from the shared cache once its transaction
    /// has ended: the current row at the object's business date becomes its
    /// committed data.
    pub fn refresh_from(&mut self, cache: &dyn IDatedCache) {
        self.enrolled_in = None;
        self.tx_data = None;
        if self.persistence != PersistenceState::Persisted {
            return;
        }
        let business_date = self.business_date;
        let current = cache
            .get_dated_data_ignoring_dates(&self.key)
            .into_iter()
            .filter(|row| row.is_current())
            .find(|row| business_date.map_or(true, |d| row.matches_business_date(d)));
        match current {
            Some(row) => {
                self.data = Some(row);
                self.from_storage = true;
            }
            None => self.persistence = PersistenceState::Deleted,
        }
    }

    /// Printable identity for error messages.
    pub fn describe(&self) -> String {
        match self.business_date {
            Some(date) => format!("{}[{}] @ {}", self.entity_type, self.key, date.to_rfc3339()),
            None => format!("{}[{}]", self.entity_type, self.key),
        }
    }
}
