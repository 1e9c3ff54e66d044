//! Snapshot model: ranges, timeline sentinels, updates and the wrapper
//! lifecycle.

use bitemporal_core::errors::TemporalError;
use bitemporal_core::models::*;
use chrono::{Duration, TimeZone, Utc};

fn day(m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, m, d, 0, 0, 0).unwrap()
}

fn make_row(qty: i64) -> Snapshot {
    Snapshot::new("P1")
        .with_attribute("qty", qty)
        .with_business(day(1, 1), infinity())
        .with_processing(day(1, 1), infinity())
}

// ── Timeline ─────────────────────────────────────────────────────────────

#[test]
fn infinity_is_the_open_end() {
    assert!(is_infinity(infinity()));
    assert!(!is_infinity(day(12, 31)));
    let open = DateRange::open_ended(day(1, 1));
    assert!(open.contains(day(12, 31)));
    assert!(!open.contains(infinity()));
    assert!(make_row(1).matches_business_date(infinity()));
}

#[test]
fn ranges_are_half_open() {
    let jan = DateRange::new(day(1, 1), day(2, 1));
    let feb = DateRange::new(day(2, 1), day(3, 1));
    assert!(!jan.intersects(&feb));
    assert!(!jan.is_disjoint(&feb), "touching ranges stitch");
    assert!(jan.contains(day(1, 31)));
    assert!(!jan.contains(day(2, 1)));
    assert!(DateRange::new(day(1, 1), day(3, 1)).covers(&feb));
    assert!(DateRange::new(day(2, 1), day(2, 1)).is_empty());
    assert_eq!(format!("{}", DateRange::open_ended(day(1, 1))), "[2024-01-01T00:00:00+00:00, inf)");
}

#[test]
fn processing_stamps_truncate_to_granularity() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::milliseconds(1_234);
    let truncated = truncate_processing(ts, Duration::milliseconds(10));
    assert_eq!(truncated.timestamp_subsec_millis(), 230);
    assert_eq!(truncate_processing(ts, Duration::zero()), ts);
}

// ── Snapshots and updates ────────────────────────────────────────────────

#[test]
fn successor_is_strictly_newer() {
    let row = make_row(5);
    let next = row.successor();
    assert_eq!(next.version, row.version + 1);
    assert!(next.same_row(&row));
    assert_eq!(next.identity(), row.identity());
}

#[test]
fn increments_add_and_reject_text() {
    let mut row = make_row(5).with_attribute("name", "north");
    AttributeUpdate::increment("qty", 10).apply(&mut row).unwrap();
    assert_eq!(row.attribute("qty"), Some(&AttributeValue::Int(15)));

    AttributeUpdate::increment("fresh", 2.5).apply(&mut row).unwrap();
    assert_eq!(row.attribute("fresh"), Some(&AttributeValue::Float(2.5)));

    let err = AttributeUpdate::increment("name", 1).apply(&mut row).unwrap_err();
    assert!(matches!(err, TemporalError::NonNumericIncrement { .. }));
}

#[test]
fn date_updates_move_bounds() {
    let mut row = make_row(1);
    AttributeUpdate::BusinessTo { value: day(6, 1) }.apply(&mut row).unwrap();
    AttributeUpdate::ProcessingTo { value: day(7, 1) }.apply(&mut row).unwrap();
    assert_eq!(row.business_range(), DateRange::new(day(1, 1), day(6, 1)));
    assert!(!row.is_current());
    assert!(row.matches_processing_date(day(3, 1)));
}

// ── Wrapper lifecycle ────────────────────────────────────────────────────

#[test]
fn committed_wrapper_goes_through_update_and_commit() {
    let mut wrapper = TxObject::committed(make_row(1));
    assert_eq!(wrapper.state(), WrapperState::Committed);
    wrapper.set_to_be_updated();
    wrapper.data_for_write().set_attribute("qty", 2.into());
    assert_eq!(wrapper.state(), WrapperState::ToBeUpdated);
    wrapper.mark_updated();
    assert_eq!(wrapper.state(), WrapperState::Updated);

    let durable = wrapper.handle_commit().cloned().unwrap();
    assert_eq!(durable.attribute("qty"), Some(&AttributeValue::Int(2)));
    assert_eq!(wrapper.state(), WrapperState::Committed);
    assert!(!wrapper.has_written());
}

#[test]
fn inserted_wrapper_refreshes_committed_copy() {
    let mut wrapper = TxObject::to_be_inserted(make_row(3));
    assert!(wrapper.committed_data().is_none());
    wrapper.mark_inserted();
    assert_eq!(wrapper.state(), WrapperState::Inserted);
    assert_eq!(wrapper.committed_data(), Some(wrapper.data_for_read()));
    assert!(wrapper.is_new_in_this_transaction());
    assert!(wrapper.needs_transactional_update());
}

#[test]
fn tombstone_stands_in_for_committed_row() {
    let mut wrapper = TxObject::committed(make_row(1));
    wrapper.data_for_write().set_attribute("qty", 9.into());
    let tombstone = wrapper.copy_for_delete();
    assert!(tombstone.is_deleted());
    assert_eq!(tombstone.data_for_read().attribute("qty"), Some(&AttributeValue::Int(1)));

    wrapper.mark_deleted();
    assert!(wrapper.handle_commit().is_none());
}

#[test]
fn version_bump_tracks_unwritten_copy() {
    let mut wrapper = TxObject::committed(make_row(1));
    wrapper.bump_versions();
    assert_eq!(wrapper.committed_data().unwrap().version, 1);
    assert_eq!(wrapper.data_for_read().version, 1);

    wrapper.data_for_write();
    wrapper.bump_committed_version();
    assert_eq!(wrapper.committed_data().unwrap().version, 2);
    assert_eq!(wrapper.data_for_read().version, 1);
}

// ── Log record shape ─────────────────────────────────────────────────────

#[test]
fn attribute_update_serializes_with_op_tag() {
    let json = serde_json::to_value(AttributeUpdate::increment("qty", 3_i64)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "op": "increment",
            "attribute": "qty",
            "delta": { "type": "int", "value": 3 }
        })
    );
    let back: AttributeUpdate = serde_json::from_value(json).unwrap();
    assert_eq!(back, AttributeUpdate::increment("qty", 3_i64));
}
