//! Unified error types for sparse tensor storage
//!
//! This module provides a centralized error type for every sparse format in
//! sptensor-sparse.
//!
//! # Design
//!
//! - **`SparseError`**: Top-level enum covering all error cases
//! - **`ValidationError`**: shapes, modes, lengths, headers
//! - **`IndexError`**: coordinates outside the tensor
//! - **`HiCooError`**: hierarchical encoding parameters and invariants
//! - Core container failures (allocation, bounds) arrive as `SparseError::Core`
//!
//! # Examples
//!
//! ```
//! use sptensor_sparse::error::{SparseError, ValidationError};
//!
//! fn validate_ndims(ndims: &[u32]) -> Result<(), SparseError> {
//!     if ndims.is_empty() {
//!         return Err(SparseError::Validation(ValidationError::EmptyShape));
//!     }
//!     if ndims.contains(&0) {
//!         return Err(SparseError::Validation(ValidationError::ZeroInShape));
//!     }
//!     Ok(())
//! }
//! assert!(validate_ndims(&[4, 0]).is_err());
//! ```

use sptensor_core::{CoreError, Index};
use thiserror::Error;

/// Top-level error type for all sparse tensor operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// Validation errors (shape, modes, lengths)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Coordinate errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// HiCOO encoding errors
    #[error("HiCOO error: {0}")]
    HiCoo(#[from] HiCooError),

    /// Core container errors (allocation, bounds-checked access)
    #[error("Container error: {0}")]
    Core(#[from] CoreError),

    /// Reading external data failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors for tensor properties
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Shape cannot be empty")]
    EmptyShape,

    #[error("Shape cannot contain zeros")]
    ZeroInShape,

    #[error("Shape dimensions must match: expected {expected}, got {got}")]
    ShapeDimsMismatch { expected: usize, got: usize },

    #[error("Indices and values must have same length: {indices} indices vs {values} values")]
    LengthMismatch { indices: usize, values: usize },

    #[error("Invalid mode order: {reason}")]
    InvalidModeOrder { reason: String },

    #[error("Invalid mode {mode} for a tensor with {nmodes} modes")]
    InvalidMode { mode: usize, nmodes: usize },

    #[error("Invalid dense modes: {reason}")]
    InvalidDenseModes { reason: String },

    #[error("Invalid file header: {reason}")]
    InvalidHeader { reason: String },
}

/// Coordinate errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Index out of bounds: index {index:?} exceeds shape {shape:?}")]
    OutOfBounds { index: Vec<Index>, shape: Vec<Index> },

    #[error("Index dimension mismatch: expected {expected}D, got {got}D")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Hierarchical COO encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HiCooError {
    #[error("Block size too large: sb_bits {sb_bits} exceeds maximum {max}")]
    BlockSizeTooLarge { sb_bits: u32, max: u32 },

    #[error("Compression flags cover {got} modes, tensor has {expected}")]
    ModeFlagMismatch { expected: usize, got: usize },

    #[error("Corrupt block structure: {reason}")]
    CorruptBlockPointers { reason: String },
}

/// Result type alias for sparse tensor operations
pub type SparseResult<T> = Result<T, SparseError>;

impl SparseError {
    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: Vec<Index>, shape: Vec<Index>) -> Self {
        SparseError::Index(IndexError::OutOfBounds { index, shape })
    }

    /// Create a corrupt block structure error
    pub fn corrupt(reason: impl Into<String>) -> Self {
        SparseError::HiCoo(HiCooError::CorruptBlockPointers {
            reason: reason.into(),
        })
    }

    /// Create an invalid mode error
    pub fn invalid_mode(mode: usize, nmodes: usize) -> Self {
        SparseError::Validation(ValidationError::InvalidMode { mode, nmodes })
    }
}
