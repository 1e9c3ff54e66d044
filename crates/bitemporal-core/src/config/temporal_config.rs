//! Temporal edit configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Knobs for the director algorithms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    // Processing clock
    pub processing_time_granularity_ms: u32,

    // Inactivation
    pub delete_on_changed_too_fast: bool,
    pub inactivate_on_same_day_update: bool,
    pub stamp_business_to_on_inactivation: bool,
    pub inactivation_business_to_days: u32,

    // Business axis
    pub business_to_is_inclusive: bool,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            processing_time_granularity_ms: 10,
            delete_on_changed_too_fast: true, // low-resolution database clocks
            inactivate_on_same_day_update: true,
            stamp_business_to_on_inactivation: false,
            inactivation_business_to_days: 1,
            business_to_is_inclusive: false,
        }
    }
}

impl TemporalConfig {
    pub fn processing_granularity(&self) -> Duration {
        Duration::milliseconds(i64::from(self.processing_time_granularity_ms))
    }
}
