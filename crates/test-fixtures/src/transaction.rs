use bitemporal_core::models::{AttributeUpdate, Snapshot, Timestamp, TxId, TxObject};
use bitemporal_core::traits::ITransaction;

/// One entry of the transactional log, with the wrapper's data as it was
/// when the entry was written.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggedOp {
    Insert(Snapshot),
    Update {
        data: Snapshot,
        update: AttributeUpdate,
    },
    Delete(Snapshot),
    Purge(Snapshot),
    Enroll(Snapshot),
}

/// Transaction that records everything the engine logs against it.
#[derive(Debug)]
pub struct RecordingTransaction {
    id: TxId,
    start: Timestamp,
    ops: Vec<LoggedOp>,
}

impl RecordingTransaction {
    pub fn new(start: Timestamp) -> Self {
        Self {
            id: TxId::new(),
            start,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[LoggedOp] {
        &self.ops
    }

    pub fn inserts(&self) -> Vec<&Snapshot> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LoggedOp::Insert(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(&Snapshot, &AttributeUpdate)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LoggedOp::Update { data, update } => Some((data, update)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<&Snapshot> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LoggedOp::Delete(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn purges(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, LoggedOp::Purge(_)))
            .count()
    }

    pub fn enrollments(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, LoggedOp::Enroll(_)))
            .count()
    }
}

impl ITransaction for RecordingTransaction {
    fn id(&self) -> TxId {
        self.id
    }

    fn processing_start_time(&self) -> Timestamp {
        self.start
    }

    fn is_in_future(&self, processing_date: Timestamp) -> bool {
        processing_date >= self.start
    }

    fn insert(&mut self, object: &TxObject) {
        self.ops.push(LoggedOp::Insert(object.data_for_read().clone()));
    }

    fn update(&mut self, object: &TxObject, update: &AttributeUpdate) {
        self.ops.push(LoggedOp::Update {
            data: object.data_for_read().clone(),
            update: update.clone(),
        });
    }

    fn delete(&mut self, object: &TxObject) {
        self.ops.push(LoggedOp::Delete(object.data_for_read().clone()));
    }

    fn purge(&mut self, object: &TxObject) {
        self.ops.push(LoggedOp::Purge(object.data_for_read().clone()));
    }

    fn enroll_object(&mut self, object: &TxObject) {
        self.ops.push(LoggedOp::Enroll(object.data_for_read().clone()));
    }
}
