use bitemporal_core::config::BitemporalConfig;
use bitemporal_core::models::{infinity, Snapshot, Timestamp};
use chrono::{TimeZone, Utc};

use crate::cache::InMemoryCache;
use crate::storage::InMemoryStorage;
use crate::transaction::RecordingTransaction;

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, date: u32) -> Timestamp {
    at(year, month, date, 0, 0)
}

pub fn at(year: i32, month: u32, date: u32, hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, date, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid fixture date {year}-{month}-{date} {hour}:{minute}"))
}

/// Current bitemporal row over `[from, to)`, `to` defaulting to infinity.
pub fn bitemporal_row(
    key: &str,
    from: Timestamp,
    to: Option<Timestamp>,
    processing_from: Timestamp,
) -> Snapshot {
    Snapshot::new(key)
        .with_business(from, to.unwrap_or_else(infinity))
        .with_processing(processing_from, infinity())
}

/// A row already closed on the processing axis.
pub fn history_row(
    key: &str,
    from: Timestamp,
    to: Option<Timestamp>,
    processing: (Timestamp, Timestamp),
) -> Snapshot {
    Snapshot::new(key)
        .with_business(from, to.unwrap_or_else(infinity))
        .with_processing(processing.0, processing.1)
}

/// Non-audited row over `[from, to)`; there is no processing axis.
pub fn business_row(key: &str, from: Timestamp, to: Option<Timestamp>) -> Snapshot {
    let mut row = Snapshot::new(key);
    row.business_from = Some(from);
    row.business_to = Some(to.unwrap_or_else(infinity));
    row
}

/// Cache, storage and configuration for one test, kept in step by `seed`.
#[derive(Debug, Default)]
pub struct Fixture {
    pub cache: InMemoryCache,
    pub storage: InMemoryStorage,
    pub config: BitemporalConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BitemporalConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Rows become both durable and cached.
    pub fn seed(&self, rows: impl IntoIterator<Item = Snapshot> + Clone) {
        self.storage.seed(rows.clone());
        self.cache.seed(rows);
    }

    pub fn tx(&self, start: Timestamp) -> RecordingTransaction {
        RecordingTransaction::new(start)
    }

    /// Writes the committed cache state through to storage.
    pub fn settle(&self) {
        self.storage.sync_from(&self.cache);
    }
}
