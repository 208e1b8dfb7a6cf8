//! Padded mutex pool for scatter updates
//!
//! Parallel sparse kernels write into shared rows (factor matrix rows, block
//! accumulators) from many threads. Locking every row is too much memory and
//! a single lock serializes everything, so the pool keeps a fixed number of
//! slot locks and maps any key onto one of them with `key mod nlocks`.
//! Distinct keys may share a slot; the critical sections of two keys that
//! share a slot never overlap.
//!
//! Slots are spread `padsize` bytes apart so locks held by different threads
//! do not share a cache line.
//!
//! # Lifecycle
//!
//! A pool starts uninitialized. [`MutexPool::init`] allocates the slots,
//! [`MutexPool::destroy`] releases them. Acquiring before `init` fails with
//! [`MutexPoolError::PoolNotInitialized`], a second `init` with
//! [`MutexPoolError::DoubleInitialization`]. Both transitions take
//! `&mut self`, so they cannot race with a held slot.
//!
//! # Build configurations
//!
//! With the `parallel` feature the slots are `parking_lot` mutexes. Without
//! it the pool keeps the same API and lifecycle checks, but acquiring does
//! not lock: single-threaded builds have nothing to exclude.
//!
//! # Usage
//!
//! ```rust
//! use sptensor_exec::{MutexPool, MutexPoolConfig};
//!
//! let pool = MutexPool::with_config(MutexPoolConfig::default()).unwrap();
//!
//! // Serialize updates to row 42 of a shared factor matrix
//! let guard = pool.acquire(42).unwrap();
//! assert_eq!(guard.slot(), 42);
//! drop(guard);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of slot locks
pub const DEFAULT_NLOCKS: usize = 1024;

/// Default distance between slots in bytes, two cache lines
pub const DEFAULT_PADSIZE: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutexPoolError {
    #[error("Mutex pool used before initialization")]
    PoolNotInitialized,

    #[error("Mutex pool is already initialized")]
    DoubleInitialization,

    #[error("Invalid lock count: {0}")]
    InvalidLockCount(usize),

    #[error("Allocation failure: could not reserve {requested} lock slots")]
    AllocationFailure { requested: usize },
}

/// Result type alias for mutex pool operations
pub type MutexPoolResult<T> = Result<T, MutexPoolError>;

/// Pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MutexPoolConfig {
    /// Number of slots; keys are mapped with `key mod nlocks`
    pub nlocks: usize,
    /// Minimum distance between two slots in bytes
    pub padsize: usize,
}

impl Default for MutexPoolConfig {
    fn default() -> Self {
        Self {
            nlocks: DEFAULT_NLOCKS,
            padsize: DEFAULT_PADSIZE,
        }
    }
}

impl MutexPoolConfig {
    /// Set the number of slots
    pub fn with_nlocks(mut self, nlocks: usize) -> Self {
        self.nlocks = nlocks;
        self
    }

    /// Set the slot padding in bytes
    pub fn with_padsize(mut self, padsize: usize) -> Self {
        self.padsize = padsize;
        self
    }

    /// Check that the pool has at least one slot
    pub fn validate(&self) -> MutexPoolResult<()> {
        if self.nlocks == 0 {
            return Err(MutexPoolError::InvalidLockCount(self.nlocks));
        }
        Ok(())
    }
}

#[cfg(feature = "parallel")]
mod slots {
    use parking_lot::{Mutex, MutexGuard};

    use super::{MutexPoolError, MutexPoolResult};

    pub(super) type Lock = Mutex<()>;
    pub(super) type Held<'a> = MutexGuard<'a, ()>;

    /// `nlocks` locks, each `stride` elements from the next
    #[derive(Debug)]
    pub(super) struct Slots {
        locks: Vec<Lock>,
        stride: usize,
    }

    impl Slots {
        pub(super) fn new(nlocks: usize, padsize: usize) -> MutexPoolResult<Self> {
            let stride = padsize.div_ceil(std::mem::size_of::<Lock>()).max(1);
            let total = nlocks
                .checked_mul(stride)
                .ok_or(MutexPoolError::AllocationFailure { requested: usize::MAX })?;

            let mut locks = Vec::new();
            locks
                .try_reserve_exact(total)
                .map_err(|_| MutexPoolError::AllocationFailure { requested: total })?;
            locks.extend((0..total).map(|_| Mutex::new(())));
            Ok(Self { locks, stride })
        }

        pub(super) fn stride(&self) -> usize {
            self.stride
        }

        pub(super) fn lock(&self, slot: usize) -> Held<'_> {
            self.locks[slot * self.stride].lock()
        }

        pub(super) fn try_lock(&self, slot: usize) -> Option<Held<'_>> {
            self.locks[slot * self.stride].try_lock()
        }
    }
}

#[cfg(not(feature = "parallel"))]
mod slots {
    use std::marker::PhantomData;

    use super::MutexPoolResult;

    pub(super) type Held<'a> = PhantomData<&'a ()>;

    /// Single-threaded stand-in: no storage, locking always succeeds
    #[derive(Debug)]
    pub(super) struct Slots;

    impl Slots {
        pub(super) fn new(_nlocks: usize, _padsize: usize) -> MutexPoolResult<Self> {
            Ok(Slots)
        }

        pub(super) fn stride(&self) -> usize {
            0
        }

        pub(super) fn lock(&self, _slot: usize) -> Held<'_> {
            PhantomData
        }

        pub(super) fn try_lock(&self, _slot: usize) -> Option<Held<'_>> {
            Some(PhantomData)
        }
    }
}

use slots::{Held, Slots};

/// Fixed-size pool of padded slot locks
#[derive(Debug, Default)]
pub struct MutexPool {
    config: MutexPoolConfig,
    slots: Option<Slots>,
}

/// Exclusive hold on one slot; the slot is released on drop
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct SlotGuard<'a> {
    slot: usize,
    _held: Held<'a>,
}

impl SlotGuard<'_> {
    /// Slot the key was mapped to
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Release the slot explicitly
    pub fn release(self) {}
}

impl std::fmt::Debug for SlotGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard").field("slot", &self.slot).finish()
    }
}

impl MutexPool {
    /// An uninitialized pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and initializes a pool in one step
    pub fn with_config(config: MutexPoolConfig) -> MutexPoolResult<Self> {
        let mut pool = Self::new();
        pool.init(config)?;
        Ok(pool)
    }

    /// Allocates `nlocks` slots, `padsize` bytes apart
    ///
    /// # Errors
    ///
    /// - `DoubleInitialization` if the pool is already initialized
    /// - `InvalidLockCount` if `nlocks == 0`
    /// - `AllocationFailure` if the padded slot array cannot be allocated
    pub fn init(&mut self, config: MutexPoolConfig) -> MutexPoolResult<()> {
        if self.slots.is_some() {
            return Err(MutexPoolError::DoubleInitialization);
        }
        config.validate()?;
        let slots = Slots::new(config.nlocks, config.padsize)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nlocks = config.nlocks,
            padsize = config.padsize,
            stride = slots.stride(),
            "initialized mutex pool"
        );
        self.config = config;
        self.slots = Some(slots);
        Ok(())
    }

    /// Releases every slot; the pool can be initialized again afterwards
    ///
    /// # Errors
    ///
    /// `PoolNotInitialized` if the pool was never initialized or was
    /// already destroyed.
    pub fn destroy(&mut self) -> MutexPoolResult<()> {
        if self.slots.take().is_none() {
            return Err(MutexPoolError::PoolNotInitialized);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(nlocks = self.config.nlocks, "destroyed mutex pool");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.is_some()
    }

    /// Number of slots
    pub fn nlocks(&self) -> usize {
        self.config.nlocks
    }

    /// Requested distance between slots in bytes
    pub fn padsize(&self) -> usize {
        self.config.padsize
    }

    /// Distance between slots in lock elements; 0 when locking is compiled out
    pub fn stride(&self) -> MutexPoolResult<usize> {
        Ok(self.initialized()?.stride())
    }

    /// Slot that `key` maps to
    pub fn slot_of(&self, key: usize) -> MutexPoolResult<usize> {
        self.initialized()?;
        Ok(key % self.config.nlocks)
    }

    /// Blocks until the slot of `key` is free and takes it
    ///
    /// There is no deadlock detection: holding two keys that alias the same
    /// slot from one thread blocks forever.
    pub fn acquire(&self, key: usize) -> MutexPoolResult<SlotGuard<'_>> {
        let slots = self.initialized()?;
        let slot = key % self.config.nlocks;
        Ok(SlotGuard {
            slot,
            _held: slots.lock(slot),
        })
    }

    /// Takes the slot of `key` if it is free
    pub fn try_acquire(&self, key: usize) -> MutexPoolResult<Option<SlotGuard<'_>>> {
        let slots = self.initialized()?;
        let slot = key % self.config.nlocks;
        Ok(slots.try_lock(slot).map(|held| SlotGuard { slot, _held: held }))
    }

    /// Runs `f` while holding the slot of `key`
    pub fn with_lock<R>(&self, key: usize, f: impl FnOnce() -> R) -> MutexPoolResult<R> {
        let _guard = self.acquire(key)?;
        Ok(f())
    }

    fn initialized(&self) -> MutexPoolResult<&Slots> {
        self.slots.as_ref().ok_or(MutexPoolError::PoolNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_before_init() {
        let pool = MutexPool::new();
        assert!(!pool.is_initialized());
        assert_eq!(pool.acquire(3).unwrap_err(), MutexPoolError::PoolNotInitialized);
        assert_eq!(pool.slot_of(3).unwrap_err(), MutexPoolError::PoolNotInitialized);
    }

    #[test]
    fn test_double_init_and_destroy() {
        let mut pool = MutexPool::new();
        pool.init(MutexPoolConfig::default()).unwrap();
        assert_eq!(
            pool.init(MutexPoolConfig::default()),
            Err(MutexPoolError::DoubleInitialization)
        );

        pool.destroy().unwrap();
        assert_eq!(pool.destroy(), Err(MutexPoolError::PoolNotInitialized));
        assert!(pool.acquire(0).is_err());

        // A destroyed pool can be set up again
        pool.init(MutexPoolConfig::default().with_nlocks(4)).unwrap();
        assert_eq!(pool.nlocks(), 4);
    }

    #[test]
    fn test_zero_locks_rejected() {
        let err = MutexPool::with_config(MutexPoolConfig::default().with_nlocks(0)).unwrap_err();
        assert_eq!(err, MutexPoolError::InvalidLockCount(0));
    }

    #[test]
    fn test_key_mapping() {
        let pool = MutexPool::with_config(MutexPoolConfig::default().with_nlocks(16)).unwrap();
        assert_eq!(pool.slot_of(5).unwrap(), 5);
        assert_eq!(pool.slot_of(21).unwrap(), 5);
        assert_eq!(pool.acquire(usize::MAX).unwrap().slot(), usize::MAX % 16);
    }

    #[test]
    fn test_with_lock_returns_value() {
        let pool = MutexPool::with_config(MutexPoolConfig::default()).unwrap();
        assert_eq!(pool.with_lock(7, || 40 + 2).unwrap(), 42);
        // The slot is free again
        assert!(pool.try_acquire(7).unwrap().is_some());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_slot_padding() {
        let pool = MutexPool::with_config(MutexPoolConfig::default()).unwrap();
        let stride = pool.stride().unwrap();
        assert!(stride * std::mem::size_of::<parking_lot::Mutex<()>>() >= pool.padsize());

        let pool = MutexPool::with_config(MutexPoolConfig::default().with_padsize(0)).unwrap();
        assert_eq!(pool.stride().unwrap(), 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_oversized_pool_is_an_error() {
        let config = MutexPoolConfig::default().with_nlocks(usize::MAX / 2);
        let err = MutexPool::with_config(config).unwrap_err();
        assert!(matches!(err, MutexPoolError::AllocationFailure { .. }));

        // A failed init leaves the pool usable for a smaller configuration
        let mut pool = MutexPool::new();
        assert!(pool.init(config).is_err());
        assert!(!pool.is_initialized());
        pool.init(MutexPoolConfig::default().with_nlocks(2)).unwrap();
        assert!(pool.acquire(1).is_ok());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_aliasing_keys_share_a_slot() {
        let pool = MutexPool::with_config(MutexPoolConfig::default().with_nlocks(8)).unwrap();
        let held = pool.acquire(3).unwrap();

        assert!(pool.try_acquire(3 + 8).unwrap().is_none());
        assert!(pool.try_acquire(4).unwrap().is_some());

        held.release();
        assert!(pool.try_acquire(11).unwrap().is_some());
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_stub_never_blocks() {
        let pool = MutexPool::with_config(MutexPoolConfig::default()).unwrap();
        let _first = pool.acquire(1).unwrap();
        let second = pool.try_acquire(1).unwrap();
        assert!(second.is_some());
        assert_eq!(pool.stride().unwrap(), 0);
    }
}
