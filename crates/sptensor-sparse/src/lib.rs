//! # sptensor-sparse
//!
//! Sparse tensor storage formats for sptensor.
//!
//! This crate provides:
//! - COO (Coordinate) tensors, the source and target of every conversion
//! - Sparse matrices in COO and CSR form
//! - Semi-sparse tensors with one or several dense modes
//! - HiCOO (Hierarchical COO) with an exact decoder
//! - Generalized HiCOO compressing a chosen subset of modes
//! - Semi-sparse HiCOO (blocked fibers)
//! - Binary tensor file header parsing
//! - Parallel block-order sorting, encoding and block traversal
//!
//! ## Quick Start
//!
//! ```
//! use sptensor_sparse::{HiCooTensor, SparseTensor};
//!
//! let mut coo = SparseTensor::<f64>::new(vec![8, 8, 8]).unwrap();
//! coo.push(&[5, 5, 5], 9.0).unwrap();
//! coo.push(&[1, 1, 1], 5.0).unwrap();
//! coo.push(&[1, 1, 3], 2.0).unwrap();
//!
//! let hicoo = HiCooTensor::from_coo(&coo, 2).unwrap();
//! assert_eq!(hicoo.bptr(), &[0, 2, 3]);
//!
//! let decoded = hicoo.to_coo().unwrap();
//! assert_eq!(decoded.pairs_sorted(), coo.pairs_sorted());
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): rayon-backed sorting and block traversal
//! - `tracing` (default): debug events from encoders and sorts
//! - `serde`: serialization of configuration types

pub mod coo;
pub mod error;
pub mod hicoo;
pub mod hicoo_general;
pub mod io;
pub mod parallel;
pub mod semi;
pub mod semi_hicoo;
pub mod sparse_matrix;

// Re-exports
pub use coo::SparseTensor;
pub use error::{HiCooError, IndexError, SparseError, SparseResult, ValidationError};
pub use hicoo::{check_sb_bits, HiCooBlock, HiCooConfig, HiCooIterator, HiCooTensor, DEFAULT_SB_BITS};
pub use hicoo_general::{HiCooGeneral, ModeIndex};
pub use io::BinHeader;
pub use semi::{SemiSparseTensor, SemiSparseTensorGeneral};
pub use semi_hicoo::SemiSparseHiCoo;
pub use sparse_matrix::{SparseMatrix, SparseMatrixCsr};
