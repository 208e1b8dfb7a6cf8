//! # sptensor-exec
//!
//! Synchronization for parallel kernels over sparse tensor storage.
//!
//! This crate provides:
//! - [`MutexPool`] - a fixed-size pool of padded slot locks that parallel
//!   kernels use to serialize conflicting scatter updates, keyed by row or
//!   block index
//! - [`MutexPoolConfig`] - pool sizing (`nlocks`, `padsize`)
//!
//! ## Features
//!
//! - `parallel` (default): real `parking_lot` locks; without it the pool is
//!   a lifecycle-checked no-op
//! - `tracing` (default): debug events on pool initialization and teardown
//! - `serde`: serialization of [`MutexPoolConfig`]

pub mod mutex_pool;

// Re-exports
pub use mutex_pool::{
    MutexPool, MutexPoolConfig, MutexPoolError, MutexPoolResult, SlotGuard, DEFAULT_NLOCKS,
    DEFAULT_PADSIZE,
};
