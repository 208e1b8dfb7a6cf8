//! Parallel HiCOO encoding and block traversal
//!
//! This module provides parallel versions of the HiCOO construction steps
//! and the parallel block iterator handed to external kernels.
//!
//! # Features
//!
//! - Parallel block-order sort of COO tensors
//! - Parallel HiCOO encoding whose output is identical to
//!   [`HiCooTensor::from_coo`]
//! - Parallel read-only traversal of HiCOO blocks
//! - Automatic fallback to sequential when `parallel` feature is disabled
//!
//! # Performance
//!
//! Sorting dominates encoding, so the parallel encoder pays off for tensors
//! with more than ~100,000 nonzeros. The block scan itself stays sequential.
//!
//! # Examples
//!
//! ```rust
//! use sptensor_sparse::{HiCooTensor, SparseTensor};
//! use sptensor_sparse::parallel::par_hicoo_from_coo;
//!
//! let coo = SparseTensor::from_coords(
//!     vec![100, 100, 100],
//!     &[vec![99, 0, 3], vec![1, 1, 1], vec![1, 2, 3]],
//!     &[1.0, 2.0, 3.0],
//! )
//! .unwrap();
//!
//! let par = par_hicoo_from_coo(&coo, 4).unwrap();
//! let seq = HiCooTensor::from_coo(&coo, 4).unwrap();
//! assert_eq!(par.bptr(), seq.bptr());
//! ```

use scirs2_core::numeric::Float;

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

use crate::coo::SparseTensor;
use crate::error::SparseResult;
use crate::hicoo::{check_sb_bits, HiCooBlock, HiCooTensor};

#[cfg(feature = "parallel")]
use crate::coo::block_order_cmp;
#[cfg(feature = "parallel")]
use sptensor_core::BlockCoords;

/// Sorts a COO tensor into HiCOO block order in parallel
///
/// Block keys are computed in parallel and the permutation is sorted with a
/// stable parallel sort, so ties keep their input order exactly as in
/// [`SparseTensor::sort_in_block_order`].
#[cfg(feature = "parallel")]
pub fn par_sort_in_block_order<T>(coo: &mut SparseTensor<T>, sb_bits: u32) -> SparseResult<()>
where
    T: Float + Send + Sync,
{
    check_sb_bits(sb_bits)?;
    let inds = coo.inds();
    let order = coo.sortorder();
    let flags = vec![true; coo.nmodes()];

    let keys: Vec<BlockCoords> = (0..coo.nnz())
        .into_par_iter()
        .map(|i| order.iter().map(|&m| inds[m][i] >> sb_bits).collect())
        .collect();

    let mut perm: Vec<usize> = (0..coo.nnz()).collect();
    perm.par_sort_by(|&a, &b| {
        keys[a]
            .cmp(&keys[b])
            .then_with(|| block_order_cmp(inds, order, &flags, sb_bits, a, b))
    });
    coo.apply_permutation(&perm);

    #[cfg(feature = "tracing")]
    tracing::debug!(nnz = coo.nnz(), sb_bits, "parallel block-order sort");
    Ok(())
}

/// Sequential fallback for par_sort_in_block_order when parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub fn par_sort_in_block_order<T>(coo: &mut SparseTensor<T>, sb_bits: u32) -> SparseResult<()>
where
    T: Float,
{
    coo.sort_in_block_order(sb_bits)
}

/// Parallel HiCOO encoding
///
/// Sorts a copy of `coo` with [`par_sort_in_block_order`] and runs the
/// single-scan encoder. For the same input and `sb_bits` the result has the
/// same `bptr`, `binds`, `einds` and values as [`HiCooTensor::from_coo`].
#[cfg(feature = "parallel")]
pub fn par_hicoo_from_coo<T>(coo: &SparseTensor<T>, sb_bits: u32) -> SparseResult<HiCooTensor<T>>
where
    T: Float + Send + Sync,
{
    check_sb_bits(sb_bits)?;
    let mut sorted = coo.clone();
    par_sort_in_block_order(&mut sorted, sb_bits)?;
    HiCooTensor::from_sorted_coo(&sorted, sb_bits)
}

/// Sequential fallback for par_hicoo_from_coo when parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub fn par_hicoo_from_coo<T>(coo: &SparseTensor<T>, sb_bits: u32) -> SparseResult<HiCooTensor<T>>
where
    T: Float,
{
    HiCooTensor::from_coo(coo, sb_bits)
}

impl<T: Float + Send + Sync> HiCooTensor<T> {
    /// Parallel iterator over all blocks
    ///
    /// Each block is visited exactly once; the order of visits is
    /// unspecified.
    #[cfg(feature = "parallel")]
    pub fn par_blocks(&self) -> impl ParallelIterator<Item = HiCooBlock<'_, T>> + '_ {
        (0..self.num_blocks())
            .into_par_iter()
            .filter_map(move |b| self.block(b).ok())
    }

    /// Sequential fallback for par_blocks when parallel feature is disabled
    #[cfg(not(feature = "parallel"))]
    pub fn par_blocks(&self) -> impl Iterator<Item = HiCooBlock<'_, T>> + '_ {
        self.blocks()
    }
}
