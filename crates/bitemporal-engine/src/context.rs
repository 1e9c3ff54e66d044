use bitemporal_core::config::TemporalConfig;
use bitemporal_core::models::{truncate_processing, Timestamp};
use bitemporal_core::traits::{IDatedCache, IStorage, ITransaction};

/// Handle threaded through every container and director call in place of an
/// ambient current-transaction lookup.
pub struct TxContext<'a> {
    pub tx: &'a mut dyn ITransaction,
    pub cache: &'a dyn IDatedCache,
    pub storage: &'a dyn IStorage,
    pub config: &'a TemporalConfig,
}

impl<'a> TxContext<'a> {
    pub fn new(
        tx: &'a mut dyn ITransaction,
        cache: &'a dyn IDatedCache,
        storage: &'a dyn IStorage,
        config: &'a TemporalConfig,
    ) -> Self {
        Self {
            tx,
            cache,
            storage,
            config,
        }
    }

    /// Transaction start on the processing axis, truncated to the configured
    /// granularity. Every inactivation in the transaction closes at this stamp.
    pub fn processing_timestamp(&self) -> Timestamp {
        truncate_processing(
            self.tx.processing_start_time(),
            self.config.processing_granularity(),
        )
    }
}
