use serde::{Deserialize, Serialize};

use super::DateRange;

/// Disposition of a business-date sub-range within one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatusKind {
    Committed = 10,
    Active = 20,
    Inactive = 30,
    Void = 40,
}

impl RangeStatusKind {
    /// Inactive and Void ranges are no longer readable.
    pub fn is_disposed(self) -> bool {
        matches!(self, Self::Inactive | Self::Void)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeStatus {
    pub range: DateRange,
    pub status: RangeStatusKind,
}

impl RangeStatus {
    pub fn new(range: DateRange, status: RangeStatusKind) -> Self {
        Self { range, status }
    }
}
