//! Behavior dispatch: one pre-allocated entry per (persistence state,
//! transaction relationship), routing data access, enrollment transitions
//! and edits.

mod table;

use bitemporal_core::errors::{BitemporalError, BitemporalResult};
use bitemporal_core::models::{PersistenceState, Snapshot, TxRelationship};

use crate::container::TemporalContainer;
use crate::object::DatedObject;

use table::BEHAVIORS;

/// Which physical snapshot backs a read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataMode {
    /// Committed data, failing if there is none.
    CurrentWithCheck,
    /// The object's own data, allocated on first use.
    GetOrAllocate,
    /// The transactional view resolved through the container.
    UseTx,
    /// Committed data while the object sits in a transaction elsewhere.
    UseNonTx,
    Deleted,
    NotSupported,
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorFlags {
    pub is_persisted: bool,
    pub is_in_memory: bool,
    pub is_deleted: bool,
    pub is_detached: bool,
    pub is_direct_reference_allowed: bool,
    pub may_set_primary_key: bool,
}

/// Every edit the enclosing object layer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Insert,
    InsertUntil,
    InsertWithIncrement,
    InsertWithIncrementUntil,
    InsertForRecovery,
    Update,
    UpdateUntil,
    InPlaceUpdate,
    Increment,
    IncrementUntil,
    Terminate,
    TerminateUntil,
    Purge,
    InactivateForArchiving,
}

impl EditKind {
    pub const ALL: [EditKind; 14] = [
        Self::Insert,
        Self::InsertUntil,
        Self::InsertWithIncrement,
        Self::InsertWithIncrementUntil,
        Self::InsertForRecovery,
        Self::Update,
        Self::UpdateUntil,
        Self::InPlaceUpdate,
        Self::Increment,
        Self::IncrementUntil,
        Self::Terminate,
        Self::TerminateUntil,
        Self::Purge,
        Self::InactivateForArchiving,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::InsertUntil => "insert_until",
            Self::InsertWithIncrement => "insert_with_increment",
            Self::InsertWithIncrementUntil => "insert_with_increment_until",
            Self::InsertForRecovery => "insert_for_recovery",
            Self::Update => "update",
            Self::UpdateUntil => "update_until",
            Self::InPlaceUpdate => "in_place_update",
            Self::Increment => "increment",
            Self::IncrementUntil => "increment_until",
            Self::Terminate => "terminate",
            Self::TerminateUntil => "terminate_until",
            Self::Purge => "purge",
            Self::InactivateForArchiving => "inactivate_for_archiving",
        }
    }

    pub fn is_insert(self) -> bool {
        matches!(
            self,
            Self::Insert
                | Self::InsertUntil
                | Self::InsertWithIncrement
                | Self::InsertWithIncrementUntil
                | Self::InsertForRecovery
        )
    }

    pub fn intent(self) -> EnrollIntent {
        match self {
            Self::Terminate | Self::TerminateUntil | Self::Purge | Self::InactivateForArchiving => {
                EnrollIntent::Delete
            }
            _ => EnrollIntent::Write,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrollIntent {
    Read,
    Write,
    Delete,
}

/// Where an allowed edit goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditRoute {
    /// The temporal director for the object's style.
    Director,
    /// Straight onto the object's own data.
    LocalData,
    /// A detached object marks itself deleted.
    DetachedTerminate,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Behavior {
    pub persistence: PersistenceState,
    pub relationship: TxRelationship,
    pub read_mode: DataMode,
    pub write_mode: DataMode,
    pub flags: BehaviorFlags,
}

const OUTSIDE_TX: &str = "Dated object modification is not supported outside a transaction.";

fn never() -> BitemporalError {
    BitemporalError::InvariantViolation("should never get here".to_string())
}

impl Behavior {
    pub fn of(persistence: PersistenceState, relationship: TxRelationship) -> &'static Behavior {
        &BEHAVIORS[persistence.index()][relationship.index()]
    }

    pub fn all() -> impl Iterator<Item = &'static Behavior> {
        BEHAVIORS.iter().flatten()
    }

    pub fn enroll_in_transaction_for_read(
        &'static self,
        object: &DatedObject,
    ) -> BitemporalResult<&'static Behavior> {
        self.transition(object, EnrollIntent::Read)
    }

    pub fn enroll_in_transaction_for_write(
        &'static self,
        object: &DatedObject,
    ) -> BitemporalResult<&'static Behavior> {
        self.transition(object, EnrollIntent::Write)
    }

    pub fn enroll_in_transaction_for_delete(
        &'static self,
        object: &DatedObject,
    ) -> BitemporalResult<&'static Behavior> {
        self.transition(object, EnrollIntent::Delete)
    }

    /// Read, write and delete enrollment share one transition table; the
    /// object only lends its identity to error messages.
    pub fn transition(
        &'static self,
        object: &DatedObject,
        _intent: EnrollIntent,
    ) -> BitemporalResult<&'static Behavior> {
        match (self.persistence, self.relationship) {
            (PersistenceState::Deleted, _) => Err(BitemporalError::deleted(
                object.describe(),
                "Cannot enroll deleted object in transaction!",
            )),
            (_, TxRelationship::DifferentTx) => Err(never()),
            (p, TxRelationship::EnrollingNow) => Ok(Self::of(p, TxRelationship::SameTx)),
            _ => Ok(self),
        }
    }

    /// Decides where `kind` goes for an object in this state, or why it is refused.
    pub fn route(&self, object: &DatedObject, kind: EditKind) -> BitemporalResult<EditRoute> {
        use PersistenceState as P;
        use TxRelationship as R;

        match (self.persistence, self.relationship) {
            (P::Deleted, _) if kind.is_insert() => Err(BitemporalError::deleted(
                object.describe(),
                "Cannot insert a deleted object!",
            )),
            (P::Deleted, _) => Err(BitemporalError::deleted(
                object.describe(),
                "Cannot change deleted object!",
            )),
            (_, R::DifferentTx) => Err(never()),
            (_, R::EnrollingNow) => Err(BitemporalError::InvariantViolation(format!(
                "{} of {} requested before the object joined the transaction",
                kind.name(),
                object.describe()
            ))),
            (P::Persisted, R::NoTx | R::ThreadNoTxObjectTx) => {
                Err(BitemporalError::unsupported(kind.name(), OUTSIDE_TX))
            }
            (P::Persisted, R::SameTx) if kind.is_insert() => Err(BitemporalError::unsupported(
                kind.name(),
                "object is already persisted",
            )),
            (P::Persisted, R::SameTx) => Ok(EditRoute::Director),
            (P::InMemory, relationship) => match kind {
                k if k.is_insert() && relationship == R::SameTx => Ok(EditRoute::Director),
                k if k.is_insert() => Err(BitemporalError::unsupported(
                    k.name(),
                    "cannot insert outside a transaction",
                )),
                EditKind::Update | EditKind::InPlaceUpdate => Ok(EditRoute::LocalData),
                k => Err(BitemporalError::unsupported(
                    k.name(),
                    "object is not persisted",
                )),
            },
            (P::Detached, _) => match kind {
                k if k.is_insert() => Err(BitemporalError::unsupported(
                    k.name(),
                    "a detached object may not be inserted!",
                )),
                EditKind::Update | EditKind::InPlaceUpdate => Ok(EditRoute::LocalData),
                EditKind::Terminate => Ok(EditRoute::DetachedTerminate),
                k => Err(BitemporalError::unsupported(
                    k.name(),
                    format!("detached {} not implemented", k.name()),
                )),
            },
        }
    }

    pub fn current_data_for_read(
        &self,
        object: &DatedObject,
        container: Option<&dyn TemporalContainer>,
    ) -> BitemporalResult<Snapshot> {
        match self.read_mode {
            DataMode::CurrentWithCheck | DataMode::UseNonTx => {
                object.current_data().cloned().ok_or_else(|| deleted_access(object))
            }
            DataMode::GetOrAllocate => Ok(object
                .current_data()
                .cloned()
                .unwrap_or_else(|| Snapshot::new(object.key().clone()))),
            DataMode::UseTx => match container {
                Some(container) => object.resolve_tx_data(container),
                None => object
                    .tx_data()
                    .or(object.current_data())
                    .cloned()
                    .ok_or_else(|| deleted_access(object)),
            },
            DataMode::Deleted => Err(deleted_access(object)),
            DataMode::NotSupported => Err(BitemporalError::unsupported("read", OUTSIDE_TX)),
            DataMode::Unexpected => Err(never()),
        }
    }

    pub fn current_data_for_write<'o>(
        &self,
        object: &'o mut DatedObject,
        container: Option<&dyn TemporalContainer>,
    ) -> BitemporalResult<&'o mut Snapshot> {
        match self.write_mode {
            DataMode::GetOrAllocate => Ok(object.data_mut_or_allocate()),
            DataMode::UseTx => {
                let data = match container {
                    Some(container) => object.resolve_tx_data(container)?,
                    None => object
                        .tx_data()
                        .or(object.current_data())
                        .cloned()
                        .ok_or_else(|| deleted_access(object))?,
                };
                Ok(object.install_tx_data(data))
            }
            DataMode::Deleted => Err(BitemporalError::deleted(
                object.key().to_string(),
                "Cannot change deleted object!",
            )),
            DataMode::NotSupported => Err(BitemporalError::unsupported("write", OUTSIDE_TX)),
            DataMode::CurrentWithCheck | DataMode::UseNonTx | DataMode::Unexpected => Err(never()),
        }
    }
}

fn deleted_access(object: &DatedObject) -> BitemporalError {
    BitemporalError::DeletedObject {
        key: object.key().to_string(),
        business_date: object.business_date().map(|d| d.to_rfc3339()),
        message: "Cannot access deleted object!".to_string(),
    }
}
