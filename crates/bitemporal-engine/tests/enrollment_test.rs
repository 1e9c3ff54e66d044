//! Read-only enrollment, promotion to write enrollment, and reads that
//! resolve through the container once the identity has been edited.

use bitemporal_core::models::{AttributeUpdate, AttributeValue, EntityKey, TemporalStyle};
use bitemporal_core::ErrorKind;
use bitemporal_engine::{DatedObject, TransactionScope};
use test_fixtures::{at, bitemporal_row, day, Fixture};

const ENTITY: &str = "Account";

#[test]
fn readers_are_promoted_when_one_of_them_writes() {
    let fx = Fixture::new();
    let row = bitemporal_row("A1", day(2024, 1, 1), None, at(2024, 1, 1, 8, 0)).with_attribute("limit", 100);
    fx.seed([row.clone()]);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut writer = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 1, 1)));
    let reader = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 3, 1)));

    assert_eq!(scope.read(&writer).unwrap().attribute("limit"), Some(&AttributeValue::Int(100)));
    scope.read(&reader).unwrap();
    assert_eq!(
        scope
            .tracker(ENTITY, TemporalStyle::Bitemporal)
            .readers_of(&row.identity())
            .len(),
        2
    );
    assert!(scope.container(ENTITY, &EntityKey::new("A1")).is_none());

    scope
        .update(&mut writer, AttributeUpdate::set("limit", 500))
        .unwrap();
    let tracker = scope.tracker(ENTITY, TemporalStyle::Bitemporal);
    assert!(tracker.is_write_enrolled(reader.handle()));
    assert!(tracker.readers_of(&row.identity()).is_empty());

    let seen = scope.read(&reader).unwrap();
    assert_eq!(seen.attribute("limit"), Some(&AttributeValue::Int(500)));
    assert_eq!(seen.business_from, Some(day(2024, 1, 1)));
}

#[test]
fn failed_edit_leaves_object_unenrolled_and_readers_read_only() {
    let fx = Fixture::new();
    let row = bitemporal_row("A1", day(2024, 1, 1), None, at(2024, 1, 1, 8, 0)).with_attribute("limit", 100);
    fx.seed([row.clone()]);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let reader = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 3, 1)));
    scope.read(&reader).unwrap();

    let mut historical = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 2, 1)))
        .as_of_processing(at(2024, 3, 1, 0, 0));
    let err = scope
        .update(&mut historical, AttributeUpdate::set("limit", 500))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionConflict);
    assert_eq!(historical.enrolled_in(), None);

    let tracker = scope.tracker(ENTITY, TemporalStyle::Bitemporal);
    assert!(!tracker.is_write_enrolled(historical.handle()));
    assert!(!tracker.is_write_enrolled(reader.handle()));
    assert_eq!(tracker.readers_of(&row.identity()), vec![reader.handle()]);

    let seen = scope.read(&reader).unwrap();
    assert_eq!(seen.attribute("limit"), Some(&AttributeValue::Int(100)));
}

#[test]
fn each_committed_row_is_enrolled_with_the_log_once() {
    let fx = Fixture::new();
    let row = bitemporal_row("A1", day(2024, 1, 1), None, at(2024, 1, 1, 8, 0)).with_attribute("limit", 100);
    fx.seed([row.clone()]);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    {
        let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);
        let mut march = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 3, 1)));
        let mut may = DatedObject::persisted(ENTITY, TemporalStyle::Bitemporal, row.clone(), Some(day(2024, 5, 1)));
        scope
            .increment(&mut march, AttributeUpdate::increment("limit", 1))
            .unwrap();
        scope
            .increment(&mut may, AttributeUpdate::increment("limit", 1))
            .unwrap();
        scope.commit();
    }
    assert_eq!(tx.enrollments(), 1);

    let limits: Vec<_> = fx
        .cache
        .current_rows(&EntityKey::new("A1"))
        .iter()
        .map(|r| r.attribute("limit").cloned())
        .collect();
    assert_eq!(
        limits,
        vec![
            Some(AttributeValue::Int(100)),
            Some(AttributeValue::Int(101)),
            Some(AttributeValue::Int(102)),
        ]
    );
}
