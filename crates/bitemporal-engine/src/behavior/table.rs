use bitemporal_core::models::{PersistenceState, TxRelationship};

use super::{Behavior, BehaviorFlags, DataMode};

use PersistenceState::*;
use TxRelationship::*;

const IN_MEMORY: BehaviorFlags = BehaviorFlags {
    is_persisted: false,
    is_in_memory: true,
    is_deleted: false,
    is_detached: false,
    is_direct_reference_allowed: true,
    may_set_primary_key: true,
};

const DETACHED: BehaviorFlags = BehaviorFlags {
    is_persisted: false,
    is_in_memory: false,
    is_deleted: false,
    is_detached: true,
    is_direct_reference_allowed: true,
    may_set_primary_key: false,
};

const PERSISTED: BehaviorFlags = BehaviorFlags {
    is_persisted: true,
    is_in_memory: false,
    is_deleted: false,
    is_detached: false,
    is_direct_reference_allowed: false,
    may_set_primary_key: false,
};

const PERSISTED_NO_TX: BehaviorFlags = BehaviorFlags {
    is_direct_reference_allowed: true,
    ..PERSISTED
};

const DELETED: BehaviorFlags = BehaviorFlags {
    is_persisted: false,
    is_in_memory: false,
    is_deleted: true,
    is_detached: false,
    is_direct_reference_allowed: false,
    may_set_primary_key: false,
};

const fn b(
    persistence: PersistenceState,
    relationship: TxRelationship,
    read_mode: DataMode,
    write_mode: DataMode,
    flags: BehaviorFlags,
) -> Behavior {
    Behavior {
        persistence,
        relationship,
        read_mode,
        write_mode,
        flags,
    }
}

/// Indexed by `[PersistenceState::index()][TxRelationship::index()]`.
pub(super) static BEHAVIORS: [[Behavior; 5]; 4] = [
    [
        b(InMemory, NoTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, IN_MEMORY),
        b(InMemory, SameTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, IN_MEMORY),
        b(InMemory, DifferentTx, DataMode::Unexpected, DataMode::Unexpected, IN_MEMORY),
        b(InMemory, ThreadNoTxObjectTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, IN_MEMORY),
        b(InMemory, EnrollingNow, DataMode::GetOrAllocate, DataMode::GetOrAllocate, IN_MEMORY),
    ],
    [
        b(Detached, NoTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, DETACHED),
        b(Detached, SameTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, DETACHED),
        b(Detached, DifferentTx, DataMode::Unexpected, DataMode::Unexpected, DETACHED),
        b(Detached, ThreadNoTxObjectTx, DataMode::GetOrAllocate, DataMode::GetOrAllocate, DETACHED),
        b(Detached, EnrollingNow, DataMode::GetOrAllocate, DataMode::GetOrAllocate, DETACHED),
    ],
    [
        b(Persisted, NoTx, DataMode::CurrentWithCheck, DataMode::NotSupported, PERSISTED_NO_TX),
        b(Persisted, SameTx, DataMode::UseTx, DataMode::UseTx, PERSISTED),
        b(Persisted, DifferentTx, DataMode::Unexpected, DataMode::Unexpected, PERSISTED),
        b(Persisted, ThreadNoTxObjectTx, DataMode::UseNonTx, DataMode::NotSupported, PERSISTED),
        b(Persisted, EnrollingNow, DataMode::CurrentWithCheck, DataMode::NotSupported, PERSISTED),
    ],
    [
        b(Deleted, NoTx, DataMode::Deleted, DataMode::Deleted, DELETED),
        b(Deleted, SameTx, DataMode::Deleted, DataMode::Deleted, DELETED),
        b(Deleted, DifferentTx, DataMode::Deleted, DataMode::Deleted, DELETED),
        b(Deleted, ThreadNoTxObjectTx, DataMode::Deleted, DataMode::Deleted, DELETED),
        b(Deleted, EnrollingNow, DataMode::Deleted, DataMode::Deleted, DELETED),
    ],
];
