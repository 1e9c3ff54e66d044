//! Property tests for the engine: business-axis tiling, history
//! preservation, idempotent range loading and ledger shadowing.

use proptest::prelude::*;

use bitemporal_core::models::{
    infinity, is_infinity, AttributeUpdate, AttributeValue, DateRange, EntityKey, RangeStatusKind,
    Snapshot, TemporalStyle, Timestamp,
};
use bitemporal_core::traits::IDatedCache;
use bitemporal_engine::container::BusinessDateContainer;
use bitemporal_engine::{DatedObject, RangeLedger, TemporalContainer, TransactionScope, TxContext};
use chrono::Duration;
use test_fixtures::{at, bitemporal_row, day, Fixture};

const ENTITY: &str = "Position";
const SEED_QTY: i64 = 100;

// =============================================================================
// Strategy helpers
// =============================================================================

#[derive(Debug, Clone)]
enum Edit {
    Set { offset: i64, value: i64 },
    Add { offset: i64, delta: i64 },
}

impl Edit {
    fn offset(&self) -> i64 {
        match self {
            Self::Set { offset, .. } | Self::Add { offset, .. } => *offset,
        }
    }
}

/// Edits effective 1..=720 days after the seeded row starts.
fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (1i64..=720, -50i64..50).prop_map(|(offset, value)| Edit::Set { offset, value }),
        (1i64..=720, -10i64..10).prop_map(|(offset, delta)| Edit::Add { offset, delta }),
    ]
}

fn seed_start() -> Timestamp {
    day(2024, 1, 1)
}

fn date_of(offset: i64) -> Timestamp {
    seed_start() + Duration::days(offset)
}

/// Value the edits leave at `date`, applied in order.
fn expected_at(edits: &[Edit], date: Timestamp) -> i64 {
    edits.iter().fold(SEED_QTY, |qty, edit| {
        if date < date_of(edit.offset()) {
            return qty;
        }
        match edit {
            Edit::Set { value, .. } => *value,
            Edit::Add { delta, .. } => qty + delta,
        }
    })
}

/// Runs `edits` in one transaction over a single seeded open-ended row.
fn run_edits(edits: &[Edit]) -> (Fixture, Snapshot) {
    let fx = Fixture::new();
    let original = bitemporal_row("P1", seed_start(), None, at(2023, 12, 1, 8, 0))
        .with_attribute("qty", SEED_QTY);
    fx.seed([original.clone()]);
    let mut tx = fx.tx(at(2026, 1, 1, 9, 0));
    let mut scope = TransactionScope::begin(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);
    for edit in edits {
        let mut object = DatedObject::persisted(
            ENTITY,
            TemporalStyle::Bitemporal,
            original.clone(),
            Some(date_of(edit.offset())),
        );
        let result = match edit {
            Edit::Set { value, .. } => scope.update(&mut object, AttributeUpdate::set("qty", *value)),
            Edit::Add { delta, .. } => {
                scope.increment(&mut object, AttributeUpdate::increment("qty", *delta))
            }
        };
        if let Err(err) = result {
            panic!("edit {edit:?} failed: {err}");
        }
    }
    scope.commit();
    (fx, original)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_current_rows_tile_the_business_axis(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let (fx, _) = run_edits(&edits);
        let rows = fx.cache.current_rows(&EntityKey::new("P1"));
        prop_assert!(!rows.is_empty());
        prop_assert_eq!(rows[0].business_start(), seed_start());
        for pair in rows.windows(2) {
            prop_assert_eq!(pair[0].business_end(), pair[1].business_start());
        }
        prop_assert!(is_infinity(rows[rows.len() - 1].business_end()));
        for row in &rows {
            prop_assert!(!row.business_range().is_empty());
        }
    }

    #[test]
    fn prop_each_segment_carries_the_replayed_value(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let (fx, _) = run_edits(&edits);
        for row in fx.cache.current_rows(&EntityKey::new("P1")) {
            let expected = expected_at(&edits, row.business_start());
            prop_assert_eq!(row.attribute("qty"), Some(&AttributeValue::Int(expected)));
        }
    }

    #[test]
    fn prop_superseded_row_is_kept_as_history(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let (fx, original) = run_edits(&edits);
        let history: Vec<Snapshot> = fx
            .cache
            .get_dated_data_ignoring_dates(&EntityKey::new("P1"))
            .into_iter()
            .filter(|row| !row.is_current())
            .collect();
        prop_assert_eq!(history.len(), 1);
        prop_assert!(history[0].same_from_dates(&original));
        prop_assert_eq!(history[0].processing_to, Some(at(2026, 1, 1, 9, 0)));
        prop_assert_eq!(&history[0].attributes, &original.attributes);
    }

    #[test]
    fn prop_replacement_rows_are_newer_versions(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let (fx, original) = run_edits(&edits);
        for row in fx.cache.current_rows(&EntityKey::new("P1")) {
            prop_assert!(row.version > original.version);
        }
    }

    #[test]
    fn prop_covered_range_is_loaded_once(
        start in 0i64..300,
        probes in prop::collection::vec((0i64..300, 1i64..300), 1..8),
    ) {
        let fx = Fixture::new();
        fx.seed([bitemporal_row("P1", seed_start(), None, at(2023, 12, 1, 8, 0))]);
        let mut tx = fx.tx(at(2026, 1, 1, 9, 0));
        let mut ctx = TxContext::new(&mut tx, &fx.cache, &fx.storage, &fx.config.temporal);
        let object = DatedObject::persisted(
            ENTITY,
            TemporalStyle::Bitemporal,
            Snapshot::new("P1"),
            Some(seed_start()),
        );
        let mut container = BusinessDateContainer::bitemporal(EntityKey::new("P1"));

        let outer = DateRange::new(date_of(start), date_of(start + 600));
        let first = container.get_objects_for_range(&mut ctx, &object, outer).unwrap();
        prop_assert_eq!(first.len(), 1);
        for (offset, width) in probes {
            let inner = DateRange::new(date_of(start + offset), date_of(start + offset + width));
            let again = container.get_objects_for_range(&mut ctx, &object, inner).unwrap();
            prop_assert_eq!(again, first.clone());
        }
        prop_assert_eq!(fx.storage.load_count(), 1);
    }

    #[test]
    fn prop_latest_ledger_entry_wins(
        entries in prop::collection::vec((0i64..100, 1i64..100, 0usize..4), 1..20),
        probe in 0i64..200,
    ) {
        let kinds = [
            RangeStatusKind::Committed,
            RangeStatusKind::Active,
            RangeStatusKind::Inactive,
            RangeStatusKind::Void,
        ];
        let mut ledger = RangeLedger::new();
        for (start, len, kind) in &entries {
            ledger.record(DateRange::new(date_of(*start), date_of(start + len)), kinds[*kind]);
        }
        let date = date_of(probe);
        let expected = entries
            .iter()
            .rev()
            .find(|(start, len, _)| date_of(*start) <= date && date < date_of(start + len))
            .map(|(_, _, kind)| kinds[*kind]);
        prop_assert_eq!(ledger.status_at(date), expected);
        prop_assert_eq!(
            ledger.is_inactivated_or_split(date),
            expected.is_some_and(RangeStatusKind::is_disposed)
        );
    }
}

#[test]
fn seeded_row_is_open_ended() {
    let (fx, original) = run_edits(&[]);
    assert_eq!(original.business_end(), infinity());
    assert_eq!(fx.cache.current_rows(&EntityKey::new("P1")), vec![original]);
}
