use crate::models::{AttributeUpdate, Timestamp, TxId, TxObject};

/// The transaction's durable log and clock.
pub trait ITransaction {
    fn id(&self) -> TxId;

    /// Untruncated start of the transaction on the processing axis.
    fn processing_start_time(&self) -> Timestamp;

    /// True when `processing_date` lies at or after the transaction's notion of now.
    fn is_in_future(&self, processing_date: Timestamp) -> bool;

    fn insert(&mut self, object: &TxObject);
    fn update(&mut self, object: &TxObject, update: &AttributeUpdate);
    fn delete(&mut self, object: &TxObject);
    fn purge(&mut self, object: &TxObject);

    /// Registers a wrapper for commit-time version checks.
    fn enroll_object(&mut self, object: &TxObject);
}
