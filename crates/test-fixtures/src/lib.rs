//! # test-fixtures
//!
//! In-memory stand-ins for the collaborators the engine consumes (the shared
//! dated cache, the storage loader and the transactional log), plus date and
//! snapshot builders and tracing setup for the test suites and benches.

mod builders;
mod cache;
mod logging;
mod storage;
mod transaction;

pub use builders::{at, bitemporal_row, business_row, day, history_row, Fixture};
pub use cache::InMemoryCache;
pub use logging::{capture_logs, init_tracing};
pub use storage::InMemoryStorage;
pub use transaction::{LoggedOp, RecordingTransaction};
