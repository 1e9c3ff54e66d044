//! Routing of reads and edits by persistence state and transaction
//! relationship, through the scope and through the behavior table.

use bitemporal_core::models::{
    AttributeUpdate, AttributeValue, PersistenceState, Snapshot, TemporalStyle, TxRelationship,
};
use bitemporal_core::ErrorKind;
use bitemporal_engine::{Behavior, DataMode, DatedObject, EditKind, EditRoute, TransactionScope};
use test_fixtures::{at, bitemporal_row, day, Fixture};

const ENTITY: &str = "Account";

fn detached() -> DatedObject {
    DatedObject::detached(
        ENTITY,
        TemporalStyle::Bitemporal,
        Snapshot::new("A1").with_attribute("limit", 100),
        Some(day(2024, 3, 1)),
    )
}

fn in_memory() -> DatedObject {
    DatedObject::in_memory(
        ENTITY,
        TemporalStyle::Bitemporal,
        Snapshot::new("A1").with_attribute("limit", 100),
        Some(day(2024, 3, 1)),
    )
}

fn persisted() -> DatedObject {
    let row = bitemporal_row("A1", day(2024, 1, 1), None, at(2024, 1, 1, 8, 0)).with_attribute("limit", 100);
    DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row, Some(day(2024, 3, 1)))
}

fn limit(data: &Snapshot) -> Option<&AttributeValue> {
    data.attribute("limit")
}

// ── Behavior Table ───────────────────────────────────────────────────────

#[test]
fn persisted_objects_read_committed_data_outside_a_transaction() {
    let b = Behavior::of(PersistenceState::Persisted, TxRelationship::NoTx);
    assert_eq!(b.read_mode, DataMode::CurrentWithCheck);
    assert_eq!(b.write_mode, DataMode::NotSupported);
    assert!(b.flags.is_persisted);

    let b = Behavior::of(PersistenceState::Persisted, TxRelationship::ThreadNoTxObjectTx);
    assert_eq!(b.read_mode, DataMode::UseNonTx);
}

#[test]
fn same_transaction_reads_through_the_container() {
    let b = Behavior::of(PersistenceState::Persisted, TxRelationship::SameTx);
    assert_eq!((b.read_mode, b.write_mode), (DataMode::UseTx, DataMode::UseTx));
}

#[test]
fn different_transaction_is_never_expected() {
    for state in [PersistenceState::InMemory, PersistenceState::Detached] {
        let b = Behavior::of(state, TxRelationship::DifferentTx);
        assert_eq!(b.read_mode, DataMode::Unexpected);
    }
    let err = Behavior::of(PersistenceState::Persisted, TxRelationship::DifferentTx)
        .route(&persisted(), EditKind::Update)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn deleted_objects_refuse_everything() {
    for relationship in TxRelationship::ALL {
        let b = Behavior::of(PersistenceState::Deleted, relationship);
        assert_eq!(b.read_mode, DataMode::Deleted);
        assert!(b.flags.is_deleted);
    }
}

#[test]
fn persisted_edit_outside_a_transaction_is_unsupported() {
    let b = Behavior::of(PersistenceState::Persisted, TxRelationship::NoTx);
    let err = b.route(&persisted(), EditKind::Update).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert!(err.to_string().contains("not supported outside a transaction"));
}

#[test]
fn every_edit_kind_has_a_route_or_a_reason() {
    let object = detached();
    for kind in EditKind::ALL {
        let b = Behavior::of(PersistenceState::Detached, TxRelationship::SameTx);
        match b.route(&object, kind) {
            Ok(EditRoute::LocalData) => {
                assert!(matches!(kind, EditKind::Update | EditKind::InPlaceUpdate))
            }
            Ok(EditRoute::DetachedTerminate) => assert_eq!(kind, EditKind::Terminate),
            Ok(EditRoute::Director) => panic!("detached {} reached a director", kind.name()),
            Err(err) => assert_eq!(err.kind(), ErrorKind::UnsupportedOperation),
        }
    }
}

// ── Without a Transaction ────────────────────────────────────────────────

#[test]
fn reads_without_transaction() {
    let read = persisted().read_without_tx().unwrap();
    assert_eq!(limit(&read), Some(&AttributeValue::Int(100)));

    let read = in_memory().read_without_tx().unwrap();
    assert_eq!(limit(&read), Some(&AttributeValue::Int(100)));
}

// ── Through the Scope ────────────────────────────────────────────────────

#[test]
fn detached_updates_stay_local() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut object = detached();
    scope
        .update(&mut object, AttributeUpdate::set("limit", 250))
        .unwrap();
    assert_eq!(
        object.current_data().and_then(limit),
        Some(&AttributeValue::Int(250))
    );
    assert_eq!(object.enrolled_in(), None);
    assert_eq!(scope.commit(), 0);
    assert!(fx.cache.is_empty());
}

#[test]
fn detached_insert_and_bounded_edits_are_refused() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut object = detached();
    let err = scope.insert(&mut object).unwrap_err();
    assert!(err.to_string().contains("a detached object may not be inserted!"));

    let err = scope
        .increment(&mut object, AttributeUpdate::increment("limit", 1))
        .unwrap_err();
    assert!(err.to_string().contains("detached increment not implemented"));
}

#[test]
fn detached_terminate_marks_the_copy_deleted() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut object = detached();
    scope.terminate(&mut object).unwrap();
    assert_eq!(object.persistence(), PersistenceState::Deleted);

    let err = scope
        .update(&mut object, AttributeUpdate::set("limit", 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeletedObject);
    assert!(err.to_string().contains("Cannot enroll deleted object in transaction!"));
}

#[test]
fn in_memory_object_is_edited_before_insert() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut object = in_memory();
    scope
        .update(&mut object, AttributeUpdate::set("limit", 300))
        .unwrap();
    let err = scope.terminate(&mut object).unwrap_err();
    assert!(err.to_string().contains("object is not persisted"));

    scope.insert(&mut object).unwrap();
    assert_eq!(object.persistence(), PersistenceState::Persisted);
    assert_eq!(limit(&scope.read(&object).unwrap()), Some(&AttributeValue::Int(300)));

    let err = scope.insert(&mut object).unwrap_err();
    assert!(err.to_string().contains("object is already persisted"));
}

#[test]
fn terminated_object_cannot_be_reinserted_or_changed() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut object = in_memory();
    scope.insert(&mut object).unwrap();
    scope.terminate(&mut object).unwrap();

    let err = scope.insert(&mut object).unwrap_err();
    assert!(err.to_string().contains("Cannot insert a deleted object!"));
    let err = scope
        .update(&mut object, AttributeUpdate::set("limit", 1))
        .unwrap_err();
    assert!(err.to_string().contains("Cannot change deleted object!"));
    assert_eq!(scope.read(&object).unwrap_err().kind(), ErrorKind::DeletedObject);
}
