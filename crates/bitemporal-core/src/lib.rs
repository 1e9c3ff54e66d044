//! # bitemporal-core
//!
//! Foundation types for the bitemporal object cache: the snapshot model and
//! its two time axes, the in-transaction wrapper, the error taxonomy,
//! configuration, and the collaborator traits the engine consumes
//! (storage loads, the shared dated cache, and the transactional log).

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::BitemporalConfig;
pub use errors::{BitemporalError, BitemporalResult, ErrorKind};
