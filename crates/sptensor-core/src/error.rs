//! Error types for the core containers.

use thiserror::Error;

/// Errors raised by vectors, matrices and other core containers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The allocator could not provide the requested capacity
    #[error("Allocation failure: could not reserve {requested} elements")]
    AllocationFailure { requested: usize },

    /// Bounds-checked access outside the container
    #[error("Index out of range: index {index} exceeds length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Shape or layout parameters are not usable
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Column count exceeds what a bounded rank matrix can address
    #[error("Rank too large: {rank} exceeds maximum {max}")]
    RankTooLarge { rank: usize, max: usize },
}

/// Result type alias for core container operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an index out of range error
    pub fn out_of_range(index: usize, len: usize) -> Self {
        CoreError::IndexOutOfRange { index, len }
    }
}
