//! # bitemporal-engine
//!
//! Transactional consistency engine for the bitemporal object cache.
//! Per-identity temporal containers with a range-status ledger, segment
//! editing directors for the three temporal styles, behavior dispatch by
//! persistence state and transaction relationship, and the per-transaction
//! enrollment tracker.

pub mod behavior;
pub mod cache_edit;
pub mod container;
pub mod context;
pub mod director;
pub mod enrollment;
pub mod ledger;
pub mod object;
pub mod scope;

pub use behavior::{Behavior, DataMode, EditKind, EditRoute, EnrollIntent};
pub use container::{new_container, TemporalContainer, TxObjectId};
pub use context::TxContext;
pub use director::{director_for, TemporalDirector, TemporalEdit};
pub use enrollment::EnrollmentTracker;
pub use ledger::RangeLedger;
pub use object::DatedObject;
pub use scope::TransactionScope;
