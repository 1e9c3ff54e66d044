//! Small state enums: object persistence, transaction relationship, wrapper
//! lifecycle, and temporal style.

use serde::{Deserialize, Serialize};

/// Where a business object's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceState {
    InMemory,
    Detached,
    Persisted,
    Deleted,
}

impl PersistenceState {
    pub const ALL: [PersistenceState; 4] = [
        Self::InMemory,
        Self::Detached,
        Self::Persisted,
        Self::Deleted,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// How a business object relates to the transaction of the calling context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxRelationship {
    /// No transaction in scope and the object is not enrolled.
    NoTx,
    /// Enrolled in the transaction in scope.
    SameTx,
    /// Enrolled in some other transaction.
    DifferentTx,
    /// No transaction in scope but the object is enrolled in one.
    ThreadNoTxObjectTx,
    /// A transaction is in scope and the object is about to join it.
    EnrollingNow,
}

impl TxRelationship {
    pub const ALL: [TxRelationship; 5] = [
        Self::NoTx,
        Self::SameTx,
        Self::DifferentTx,
        Self::ThreadNoTxObjectTx,
        Self::EnrollingNow,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Lifecycle of an in-transaction wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperState {
    Committed = 1,
    ToBeUpdated = 2,
    Updated = 3,
    Deleted = 5,
    ToBeInserted = 6,
    Inserted = 7,
}

/// Which time axes an entity type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalStyle {
    /// Processing date only.
    AuditOnly,
    /// Business date only.
    NonAudited,
    Bitemporal,
}

impl TemporalStyle {
    pub fn has_business_axis(self) -> bool {
        !matches!(self, Self::AuditOnly)
    }

    pub fn has_processing_axis(self) -> bool {
        !matches!(self, Self::NonAudited)
    }
}
