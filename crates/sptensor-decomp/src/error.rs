//! Error types for decomposition result containers

use sptensor_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KruskalError {
    #[error("Rank too large: {rank} exceeds maximum {max}")]
    RankTooLarge { rank: usize, max: usize },

    #[error("Invalid rank: {0}")]
    InvalidRank(usize),

    #[error("Mode count mismatch: expected {expected}, got {got}")]
    ModeCountMismatch { expected: usize, got: usize },

    #[error("Factor storage error: {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for Kruskal tensor operations
pub type KruskalResult<T> = Result<T, KruskalError>;
