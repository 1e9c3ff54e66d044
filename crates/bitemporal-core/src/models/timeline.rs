//! Time axes: the infinity sentinel, half-open date ranges, and the
//! processing-clock truncation.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Every date on both axes.
pub type Timestamp = DateTime<Utc>;

static INFINITY: LazyLock<Timestamp> = LazyLock::new(|| {
    Utc.with_ymd_and_hms(9999, 12, 1, 23, 59, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
});

/// Sentinel meaning "still true" on the business axis and "still current" on
/// the processing axis.
pub fn infinity() -> Timestamp {
    *INFINITY
}

pub fn is_infinity(ts: Timestamp) -> bool {
    ts >= *INFINITY
}

pub fn dawn_of_time() -> Timestamp {
    DateTime::<Utc>::MIN_UTC
}

pub fn end_of_time() -> Timestamp {
    DateTime::<Utc>::MAX_UTC
}

pub fn epoch() -> Timestamp {
    Utc.timestamp_opt(0, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Floors `ts` to a multiple of `granularity` so that the stamp survives a
/// round trip through a database column with a coarse clock.
pub fn truncate_processing(ts: Timestamp, granularity: Duration) -> Timestamp {
    let step = granularity.num_milliseconds();
    if step <= 1 {
        return ts;
    }
    let millis = ts.timestamp_millis();
    let floored = millis - millis.rem_euclid(step);
    Utc.timestamp_millis_opt(floored).single().unwrap_or(ts)
}

/// Half-open interval `[start, end)` on one time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// `[start, infinity)`.
    pub fn open_ended(start: Timestamp) -> Self {
        Self::new(start, infinity())
    }

    pub fn unbounded() -> Self {
        Self::new(dawn_of_time(), end_of_time())
    }

    pub fn contains(&self, date: Timestamp) -> bool {
        self.start <= date && date < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersects(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when the two ranges neither overlap nor touch.
    pub fn is_disjoint(&self, other: &DateRange) -> bool {
        other.end < self.start || other.start > self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = if is_infinity(self.end) {
            "inf".to_string()
        } else {
            self.end.to_rfc3339()
        };
        write!(f, "[{}, {})", self.start.to_rfc3339(), end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_floors_to_granularity() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_127).unwrap();
        let truncated = truncate_processing(ts, Duration::milliseconds(10));
        assert_eq!(truncated.timestamp_millis(), 1_700_000_000_120);
    }

    #[test]
    fn zero_granularity_is_identity() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_127).unwrap();
        assert_eq!(truncate_processing(ts, Duration::zero()), ts);
    }

    #[test]
    fn half_open_contains() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let r = DateRange::new(a, b);
        assert!(r.contains(a));
        assert!(!r.contains(b));
        assert!(DateRange::open_ended(b).contains(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));
    }
}
