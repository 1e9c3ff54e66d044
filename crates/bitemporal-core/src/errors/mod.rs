mod bitemporal_error;
mod storage_error;
mod temporal_error;

pub use bitemporal_error::{BitemporalError, BitemporalResult, ErrorKind};
pub use storage_error::StorageError;
pub use temporal_error::TemporalError;
