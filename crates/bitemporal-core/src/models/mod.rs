mod attribute;
mod ids;
mod range_status;
mod snapshot;
mod states;
mod timeline;
mod tx_object;
mod update;

pub use attribute::AttributeValue;
pub use ids::{ObjectHandle, TxId};
pub use range_status::{RangeStatus, RangeStatusKind};
pub use snapshot::{EntityKey, Snapshot, SnapshotId};
pub use states::{PersistenceState, TemporalStyle, TxRelationship, WrapperState};
pub use timeline::{
    dawn_of_time, end_of_time, epoch, infinity, is_infinity, truncate_processing, DateRange,
    Timestamp,
};
pub use tx_object::TxObject;
pub use update::AttributeUpdate;
