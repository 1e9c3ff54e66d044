//! RangeLedger: append-only log of business-date dispositions, plus the
//! widest range already loaded from storage.

use bitemporal_core::models::{
    dawn_of_time, end_of_time, epoch, infinity, DateRange, RangeStatus, RangeStatusKind,
    Timestamp,
};

/// Lookups scan most-recent-first, so a later entry shadows an earlier one
/// over the sub-range they share.
#[derive(Debug, Clone, Default)]
pub struct RangeLedger {
    statuses: Vec<RangeStatus>,
    loaded: Option<DateRange>,
}

impl RangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, range: DateRange, status: RangeStatusKind) {
        self.statuses.push(RangeStatus::new(range, status));
    }

    pub fn entries(&self) -> &[RangeStatus] {
        &self.statuses
    }

    pub fn loaded_range(&self) -> Option<DateRange> {
        self.loaded
    }

    /// Latest disposition recorded for `date`.
    pub fn status_at(&self, date: Timestamp) -> Option<RangeStatusKind> {
        self.statuses
            .iter()
            .rev()
            .find(|rs| rs.range.contains(date))
            .map(|rs| rs.status)
    }

    pub fn is_inactivated_or_split(&self, date: Timestamp) -> bool {
        self.status_at(date).is_some_and(RangeStatusKind::is_disposed)
    }

    /// Widens the loaded range with `range`, or replaces it when the two
    /// neither overlap nor touch.
    pub fn stitch(&mut self, range: DateRange) {
        self.loaded = Some(match self.loaded {
            None => range,
            Some(current) if current.is_disjoint(&range) => range,
            Some(current) => DateRange::new(
                current.start.min(range.start),
                current.end.max(range.end),
            ),
        });
    }

    /// True when `range` needs no storage round trip. A hit on a recorded
    /// readable entry becomes the new loaded range.
    pub fn have_complete_range(&mut self, range: DateRange) -> bool {
        if self.loaded.is_some_and(|loaded| loaded.covers(&range)) {
            return true;
        }
        if self.statuses.len() < 2 {
            return false;
        }
        match self.statuses.iter().rev().find(|rs| rs.range.covers(&range)) {
            Some(rs) if rs.status.is_disposed() => false,
            Some(rs) => {
                self.loaded = Some(rs.range);
                true
            }
            None => false,
        }
    }

    pub fn set_infinite_range(&mut self) {
        self.loaded = Some(DateRange::new(dawn_of_time(), end_of_time()));
    }

    /// Forgets every entry and marks the whole axis void.
    pub fn reset_to_void(&mut self) {
        self.statuses.clear();
        self.record(DateRange::new(epoch(), infinity()), RangeStatusKind::Void);
    }
}
