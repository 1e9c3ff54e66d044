mod dated_cache;
mod storage;
mod transaction;

pub use dated_cache::IDatedCache;
pub use storage::IStorage;
pub use transaction::ITransaction;
