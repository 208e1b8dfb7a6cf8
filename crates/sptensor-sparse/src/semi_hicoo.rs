//! Semi-sparse HiCOO: blocked sparse modes with dense fibers
//!
//! Combines [`SemiSparseTensor`] and HiCOO blocking: the dense mode stays a
//! matrix of fibers, while the fiber coordinates over the remaining
//! `nmodes - 1` modes are compressed into block coordinates and narrow
//! in-block offsets. `bptr` partitions fibers, not scalar nonzeros.

use scirs2_core::numeric::Float;
use sptensor_core::{
    BlockCoords, BlockIndex, BlockIndexVector, ElementIndex, ElementIndexVector, Index,
    IndexVector, Matrix, NnzIndex, NnzIndexVector,
};

use crate::coo::SparseTensor;
use crate::error::{SparseError, SparseResult, ValidationError};
use crate::hicoo::{check_sb_bits, offset_mask};
use crate::semi::SemiSparseTensor;

/// HiCOO-compressed semi-sparse tensor with one dense mode
#[derive(Debug, Clone)]
pub struct SemiSparseHiCoo<T> {
    ndims: Vec<Index>,
    /// The dense mode
    mode: usize,
    sortorder: Vec<usize>,
    sb_bits: u32,
    /// Compressed modes, ascending; `binds`/`einds` are aligned with it
    smodes: Vec<usize>,
    bptr: NnzIndexVector,
    binds: Vec<BlockIndexVector>,
    einds: Vec<ElementIndexVector>,
    /// One row per fiber
    values: Matrix<T>,
}

impl<T: Float> SemiSparseHiCoo<T> {
    /// Blocks the fibers of `semi`.
    ///
    /// Fibers are sorted into block order on a copy first, so any
    /// semi-sparse tensor is accepted.
    pub fn from_semi_sparse(semi: &SemiSparseTensor<T>, sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        let mut sorted = semi.clone();
        sorted.sort_in_block_order(sb_bits)?;

        let mode = semi.mode();
        let nfibers = sorted.nnz();
        let smodes: Vec<usize> = (0..semi.nmodes()).filter(|&m| m != mode).collect();
        let inds = sorted.inds();
        let mask = offset_mask(sb_bits);

        let mut bptr = NnzIndexVector::new();
        let mut binds: Vec<BlockIndexVector> = smodes.iter().map(|_| BlockIndexVector::new()).collect();
        let mut einds: Vec<ElementIndexVector> = smodes.iter().map(|_| ElementIndexVector::new()).collect();

        bptr.append(0)?;
        let mut current: Option<BlockCoords> = None;
        for f in 0..nfibers {
            let key: BlockCoords = smodes.iter().map(|&m| inds[m][f] >> sb_bits).collect();
            if current.as_ref() != Some(&key) {
                if current.is_some() {
                    bptr.append(f)?;
                }
                for (mode_binds, &b) in binds.iter_mut().zip(&key) {
                    mode_binds.append(b)?;
                }
                current = Some(key);
            }
            for (mode_einds, &m) in einds.iter_mut().zip(&smodes) {
                mode_einds.append((inds[m][f] & mask) as ElementIndex)?;
            }
        }
        if nfibers > 0 {
            bptr.append(nfibers)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nfibers,
            nblocks = bptr.len() - 1,
            mode,
            sb_bits,
            "encoded semi-sparse HiCOO tensor"
        );
        Ok(Self {
            ndims: semi.ndims().to_vec(),
            mode,
            sortorder: semi.sortorder().to_vec(),
            sb_bits,
            smodes,
            bptr,
            binds,
            einds,
            values: sorted.values().clone(),
        })
    }

    /// Encodes a COO tensor with `mode` dense.
    pub fn from_coo(coo: &SparseTensor<T>, mode: usize, sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        Self::from_semi_sparse(&SemiSparseTensor::from_coo(coo, mode)?, sb_bits)
    }

    /// Rebuilds the semi-sparse tensor, fibers in block order.
    pub fn to_semi_sparse(&self) -> SparseResult<SemiSparseTensor<T>> {
        let nfibers = self.nnz();
        let mut inds: Vec<IndexVector> = (0..self.nmodes()).map(|_| IndexVector::new()).collect();
        for (k, &m) in self.smodes.iter().enumerate() {
            let mode_inds = &mut inds[m];
            for b in 0..self.num_blocks() {
                let base = self.binds[k][b] << self.sb_bits;
                for f in self.bptr[b]..self.bptr[b + 1] {
                    mode_inds.append(base | self.einds[k][f] as Index)?;
                }
            }
            debug_assert_eq!(mode_inds.len(), nfibers);
        }
        Ok(SemiSparseTensor::from_parts(
            self.ndims.clone(),
            self.mode,
            self.sortorder.clone(),
            inds,
            self.values.clone(),
        ))
    }

    /// Decodes to COO, dropping zero fiber entries.
    pub fn to_coo(&self) -> SparseResult<SparseTensor<T>> {
        self.to_semi_sparse()?.to_coo()
    }

    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    /// The dense mode
    pub fn mode(&self) -> usize {
        self.mode
    }

    pub fn sb_bits(&self) -> u32 {
        self.sb_bits
    }

    /// Number of fibers
    pub fn nnz(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_blocks(&self) -> usize {
        self.bptr.len().saturating_sub(1)
    }

    pub fn bptr(&self) -> &[NnzIndex] {
        &self.bptr
    }

    fn position(&self, mode: usize) -> SparseResult<usize> {
        if mode == self.mode {
            return Err(ValidationError::InvalidDenseModes {
                reason: format!("mode {} is stored densely", mode),
            }
            .into());
        }
        self.smodes
            .iter()
            .position(|&m| m == mode)
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    /// Block coordinates along sparse `mode`
    pub fn binds(&self, mode: usize) -> SparseResult<&[BlockIndex]> {
        let k = self.position(mode)?;
        Ok(&self.binds[k])
    }

    /// In-block fiber offsets along sparse `mode`
    pub fn einds(&self, mode: usize) -> SparseResult<&[ElementIndex]> {
        let k = self.position(mode)?;
        Ok(&self.einds[k])
    }

    /// Dense row of fiber `i`
    pub fn fiber(&self, i: usize) -> SparseResult<&[T]> {
        Ok(self.values.row(i)?)
    }

    /// Fiber matrix
    pub fn values(&self) -> &Matrix<T> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseTensor<f64> {
        SparseTensor::from_coords(
            vec![8, 8, 3],
            &[
                vec![5, 5, 0],
                vec![1, 1, 2],
                vec![1, 3, 1],
                vec![1, 1, 0],
            ],
            &[9.0, 2.0, 7.0, 5.0],
        )
        .unwrap()
    }

    #[test]
    fn test_semi_hicoo_layout() {
        let shc = SemiSparseHiCoo::from_coo(&sample(), 2, 2).unwrap();

        // Fibers (1,1), (1,3) in block (0,0); (5,5) in block (1,1)
        assert_eq!(shc.nnz(), 3);
        assert_eq!(shc.num_blocks(), 2);
        assert_eq!(shc.bptr(), &[0, 2, 3]);
        assert_eq!(shc.binds(0).unwrap(), &[0, 1]);
        assert_eq!(shc.einds(1).unwrap(), &[1, 3, 1]);
        assert_eq!(shc.fiber(0).unwrap(), &[5.0, 0.0, 2.0]);
        assert!(shc.binds(2).is_err());
        assert!(shc.einds(7).is_err());
    }

    #[test]
    fn test_semi_hicoo_roundtrip() {
        let coo = sample();
        for sb_bits in [0, 1, 2, 8] {
            let shc = SemiSparseHiCoo::from_coo(&coo, 2, sb_bits).unwrap();
            assert_eq!(shc.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());
        }
        let shc = SemiSparseHiCoo::from_coo(&coo, 0, 1).unwrap();
        assert_eq!(shc.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());
    }

    #[test]
    fn test_semi_hicoo_to_semi_sparse() {
        let semi = SemiSparseTensor::from_coo(&sample(), 2).unwrap();
        let shc = SemiSparseHiCoo::from_semi_sparse(&semi, 2).unwrap();
        let back = shc.to_semi_sparse().unwrap();
        assert_eq!(back.nnz(), semi.nnz());
        assert_eq!(back.mode_indices(1).unwrap(), &[1, 3, 5]);
        assert_eq!(back.values(), semi.values());
    }

    #[test]
    fn test_semi_hicoo_block_size_too_large() {
        assert!(SemiSparseHiCoo::from_coo(&sample(), 2, 9).is_err());
    }
}
