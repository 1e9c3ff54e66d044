//! Entities with a business axis only: edits truncate and replace segments
//! in place and never leave history behind.

use bitemporal_core::models::{
    infinity, AttributeUpdate, AttributeValue, EntityKey, Snapshot, TemporalStyle, Timestamp,
};
use bitemporal_core::traits::IDatedCache;
use bitemporal_core::ErrorKind;
use bitemporal_engine::{DatedObject, TransactionScope};
use test_fixtures::{at, business_row, day, Fixture};

const ENTITY: &str = "PriceBand";

fn seeded(fx: &Fixture, key: &str, price: i64) -> Snapshot {
    let row = business_row(key, day(2024, 1, 1), None).with_attribute("price", price);
    fx.seed([row.clone()]);
    row
}

fn view(row: &Snapshot, business_date: Timestamp) -> DatedObject {
    DatedObject::persisted(ENTITY, TemporalStyle::NonAudited, row.clone(), Some(business_date))
}

fn layout(fx: &Fixture, key: &str) -> Vec<(Timestamp, Timestamp, Option<i64>)> {
    fx.cache
        .current_rows(&EntityKey::new(key))
        .iter()
        .map(|row| {
            (
                row.business_start(),
                row.business_end(),
                row.attribute("price").and_then(AttributeValue::as_i64),
            )
        })
        .collect()
}

fn row_count(fx: &Fixture, key: &str) -> usize {
    fx.cache.get_dated_data_ignoring_dates(&EntityKey::new(key)).len()
}

#[test]
fn update_cuts_the_tail_and_inserts_a_replacement() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut june = view(&original, day(2024, 6, 1));
    scope.update(&mut june, AttributeUpdate::set("price", 12)).unwrap();
    scope.commit();

    assert_eq!(
        layout(&fx, "P1"),
        vec![
            (day(2024, 1, 1), day(2024, 6, 1), Some(10)),
            (day(2024, 6, 1), infinity(), Some(12)),
        ]
    );
    assert_eq!(row_count(&fx, "P1"), 2);
    assert!(fx
        .cache
        .current_rows(&EntityKey::new("P1"))
        .iter()
        .all(|row| row.processing_from.is_none()));
}

#[test]
fn cut_of_committed_row_is_logged_as_an_update() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut june = view(&original, day(2024, 6, 1));
    scope.update(&mut june, AttributeUpdate::set("price", 12)).unwrap();
    scope.commit();

    let updates = tx.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1, &AttributeUpdate::BusinessTo { value: day(2024, 6, 1) });
    assert_eq!(tx.inserts().len(), 1);
}

#[test]
fn update_on_segment_start_rewrites_in_place() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut first_day = view(&original, day(2024, 1, 1));
    scope.update(&mut first_day, AttributeUpdate::set("price", 11)).unwrap();
    scope.commit();

    assert_eq!(layout(&fx, "P1"), vec![(day(2024, 1, 1), infinity(), Some(11))]);
    assert!(tx.inserts().is_empty());
}

#[test]
fn update_until_splits_into_three() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut march = view(&original, day(2024, 3, 1));
    scope
        .update_until(&mut march, AttributeUpdate::set("price", 12), day(2024, 6, 1))
        .unwrap();
    scope.commit();

    assert_eq!(
        layout(&fx, "P1"),
        vec![
            (day(2024, 1, 1), day(2024, 3, 1), Some(10)),
            (day(2024, 3, 1), day(2024, 6, 1), Some(12)),
            (day(2024, 6, 1), infinity(), Some(10)),
        ]
    );
}

#[test]
fn increment_adds_from_the_date_onwards() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut march = view(&original, day(2024, 3, 1));
    scope
        .increment(&mut march, AttributeUpdate::increment("price", 5))
        .unwrap();
    scope.commit();

    assert_eq!(
        layout(&fx, "P1"),
        vec![
            (day(2024, 1, 1), day(2024, 3, 1), Some(10)),
            (day(2024, 3, 1), infinity(), Some(15)),
        ]
    );
}

#[test]
fn terminate_truncates_without_history() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut june = view(&original, day(2024, 6, 1));
    scope.terminate(&mut june).unwrap();
    let july = view(&original, day(2024, 7, 1));
    assert_eq!(scope.read(&july).unwrap_err().kind(), ErrorKind::DeletedObject);
    scope.commit();

    assert_eq!(layout(&fx, "P1"), vec![(day(2024, 1, 1), day(2024, 6, 1), Some(10))]);
    assert_eq!(row_count(&fx, "P1"), 1);
}

#[test]
fn terminate_until_keeps_the_far_tail() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut march = view(&original, day(2024, 3, 1));
    scope.terminate_until(&mut march, day(2024, 6, 1)).unwrap();
    scope.commit();

    assert_eq!(
        layout(&fx, "P1"),
        vec![
            (day(2024, 1, 1), day(2024, 3, 1), Some(10)),
            (day(2024, 6, 1), infinity(), Some(10)),
        ]
    );
}

#[test]
fn in_place_update_is_not_implemented() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut march = view(&original, day(2024, 3, 1));
    let err = scope
        .in_place_update(&mut march, AttributeUpdate::set("price", 12))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert!(err.to_string().contains("Not implemented yet!"));
}

#[test]
fn archiving_is_unsupported_without_a_processing_axis() {
    let fx = Fixture::new();
    let original = seeded(&fx, "P1", 10);
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut march = view(&original, day(2024, 3, 1));
    let err = scope
        .inactivate_for_archiving(&mut march, at(2024, 6, 30, 0, 0), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[test]
fn recovery_insert_needs_business_bounds() {
    let fx = Fixture::new();
    let mut tx = fx.tx(at(2024, 7, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);

    let mut band = DatedObject::in_memory(
        ENTITY,
        TemporalStyle::NonAudited,
        Snapshot::new("P1").with_attribute("price", 9),
        Some(day(2024, 1, 1)),
    );
    let err = scope.insert_for_recovery(&mut band).unwrap_err();
    assert!(err.to_string().contains("need to specify business_from"));

    let mut band = DatedObject::in_memory(
        ENTITY,
        TemporalStyle::NonAudited,
        business_row("P1", day(2024, 1, 1), Some(day(2024, 4, 1))),
        Some(day(2024, 1, 1)),
    );
    scope.insert_for_recovery(&mut band).unwrap();
    scope.commit();
    assert_eq!(layout(&fx, "P1"), vec![(day(2024, 1, 1), day(2024, 4, 1), None)]);
}
