//! Storage comparison between COO and HiCOO encodings of the same tensor

use scirs2_core::numeric::Float;
use sptensor_core::{BlockIndex, ElementIndex, Index, NnzIndex};
use sptensor_sparse::{HiCooTensor, SparseTensor};

/// Index storage of a COO tensor next to its HiCOO encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatStats {
    pub nnz: usize,
    pub num_blocks: usize,
    /// Bytes of per-mode coordinates in COO
    pub coo_index_bytes: usize,
    /// Bytes of block pointers, block coordinates and element offsets in HiCOO
    pub hicoo_index_bytes: usize,
}

impl FormatStats {
    /// Measure `hicoo` against the COO tensor it was encoded from
    pub fn compare<T: Float>(coo: &SparseTensor<T>, hicoo: &HiCooTensor<T>) -> Self {
        let nmodes = coo.nmodes();
        let nnz = coo.nnz();
        let num_blocks = hicoo.num_blocks();

        let coo_index_bytes = nmodes * nnz * std::mem::size_of::<Index>();
        let hicoo_index_bytes = hicoo.bptr().len() * std::mem::size_of::<NnzIndex>()
            + nmodes * num_blocks * std::mem::size_of::<BlockIndex>()
            + nmodes * nnz * std::mem::size_of::<ElementIndex>();

        let stats = Self {
            nnz,
            num_blocks,
            coo_index_bytes,
            hicoo_index_bytes,
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            nnz,
            num_blocks,
            sb_bits = hicoo.sb_bits(),
            ratio = stats.compression_ratio(),
            "HiCOO index compression"
        );

        stats
    }

    /// COO index bytes divided by HiCOO index bytes
    pub fn compression_ratio(&self) -> f64 {
        if self.hicoo_index_bytes == 0 {
            return 1.0;
        }
        self.coo_index_bytes as f64 / self.hicoo_index_bytes as f64
    }

    pub fn avg_nnz_per_block(&self) -> f64 {
        if self.num_blocks == 0 {
            return 0.0;
        }
        self.nnz as f64 / self.num_blocks as f64
    }
}
