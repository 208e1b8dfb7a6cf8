//! # sptensor - Sparse Tensor Storage Stack
//!
//! Compact storage formats for sparse tensors, the containers they are built
//! from, CP decomposition results and the locks parallel kernels share.
//!
//! This is the **meta crate** that re-exports all sptensor components for convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use sptensor::prelude::*;
//!
//! let mut coo = SparseTensor::<f64>::new(vec![8, 8, 8])?;
//! coo.push(&[5, 5, 5], 9.0)?;
//! coo.push(&[1, 1, 1], 5.0)?;
//! coo.push(&[1, 1, 3], 2.0)?;
//!
//! let hicoo = HiCooTensor::with_config(&coo, &HiCooConfig::default().with_sb_bits(2))?;
//! assert_eq!(hicoo.num_blocks(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Containers ([`core`])
//!
//! Index widths, growable vectors, padded dense matrices and key-value pairs.
//!
//! ```
//! use sptensor::core::{Matrix, RankMatrix};
//!
//! let factor = Matrix::<f64>::new(100, 10).unwrap();
//! assert_eq!(factor.stride(), 16);
//! assert!(RankMatrix::<f64>::new(10, 300).is_err());
//! ```
//!
//! ### Sparse Formats ([`sparse`])
//!
//! COO, semi-sparse, HiCOO, generalized HiCOO and semi-sparse HiCOO tensors,
//! plus COO/CSR sparse matrices.
//!
//! ```
//! use sptensor::sparse::{HiCooTensor, SparseTensor};
//!
//! let coords = [vec![0, 0], vec![3, 2]];
//! let coo = SparseTensor::<f64>::from_coords(vec![4, 4], &coords, &[1.0, 2.0]).unwrap();
//! let hicoo = HiCooTensor::from_coo(&coo, 1).unwrap();
//! assert_eq!(hicoo.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());
//! ```
//!
//! ### Decomposition Results ([`decomp`])
//!
//! Kruskal tensors holding CP factors, weights and fit.
//!
//! ### Parallel Synchronization ([`exec`])
//!
//! A padded mutex pool keyed by row or block index.
//!
//! ```
//! use sptensor::exec::{MutexPool, MutexPoolConfig};
//!
//! let pool = MutexPool::with_config(MutexPoolConfig::default().with_nlocks(64)).unwrap();
//! let total = pool.with_lock(17, || 1 + 1).unwrap();
//! assert_eq!(total, 2);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): rayon-backed sorting, encoding, block traversal and real pool locks
//! - `tracing` (default): debug events plus [`tracing_support::init_tracing`]
//! - `serde`: serialization of configuration types

#![deny(warnings)]

// Re-export all components
pub use sptensor_core as core;
pub use sptensor_decomp as decomp;
pub use sptensor_exec as exec;
pub use sptensor_sparse as sparse;

pub mod stats;
pub mod tracing_support;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use sptensor::prelude::*;
    //!
    //! let coo = SparseTensor::<f64>::new(vec![10, 20, 30]).unwrap();
    //! assert_eq!(coo.nnz(), 0);
    //! ```

    // Containers
    pub use crate::core::{
        Index, KeyValuePair, Matrix, RankMatrix, TypedVector, ValueVector, MAX_SB_BITS,
    };

    // Sparse formats
    pub use crate::sparse::{
        HiCooConfig, HiCooGeneral, HiCooTensor, SemiSparseHiCoo, SemiSparseTensor,
        SparseMatrix, SparseTensor,
    };

    // Decomposition results
    pub use crate::decomp::{KruskalTensor, RankKruskalTensor};

    // Synchronization
    pub use crate::exec::{MutexPool, MutexPoolConfig};

    // Diagnostics
    pub use crate::stats::FormatStats;
}
