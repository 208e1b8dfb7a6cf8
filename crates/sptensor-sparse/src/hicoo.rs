//! HiCOO (Hierarchical COO) format for N-dimensional sparse tensors
//!
//! # Overview
//!
//! HiCOO partitions the index space of every mode into blocks of
//! `2^sb_bits` coordinates. Nonzeros that share a block coordinate tuple are
//! stored together: the block stores one [`BlockIndex`] per mode, and each
//! nonzero only keeps a narrow [`ElementIndex`] offset per mode. For tensors
//! with clustered nonzeros this replaces a full-width index per mode per
//! nonzero with one byte, and keeps nonzeros of a block close in memory.
//!
//! # Structure
//!
//! - `bptr`: block pointers, length `nblocks + 1`; block `b` owns nonzeros
//!   `bptr[b]..bptr[b + 1]`
//! - `binds[m]`: block coordinate of every block along mode `m`
//!   (`index >> sb_bits`)
//! - `einds[m]`: offset of every nonzero inside its block
//!   (`index & (2^sb_bits - 1)`)
//! - `values`: nonzero values, index-aligned with `einds`
//!
//! A coordinate is rebuilt as `(binds[m][b] << sb_bits) | einds[m][i]`.
//!
//! # Example
//!
//! For `ndims = [8, 8, 8]` and `sb_bits = 2` (block size 4):
//! - nonzeros (1,1,1), (1,1,3), (5,5,5)
//! - blocks (0,0,0) and (1,1,1)
//! - element offsets (1,1,1), (1,1,3), (1,1,1)
//! - `bptr = [0, 2, 3]`
//!
//! # Complexity
//!
//! - **Encoding a block-sorted COO tensor**: O(nnz × nmodes), one scan
//! - **Encoding an unsorted COO tensor**: O(nnz × log(nnz)) for sorting
//! - **Decoding**: O(nnz × nmodes)
//! - **Memory**: O(nnz × nmodes) bytes for offsets + O(nblocks × nmodes) indices

use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use scirs2_core::ndarray_ext::ArrayD;
use scirs2_core::numeric::Float;
use sptensor_core::{
    to_usize, BlockCoords, BlockIndex, BlockIndexVector, Coords, CoreError, CoreResult,
    ElementIndex, ElementIndexVector, Index, NnzIndex, NnzIndexVector, ValueVector, MAX_SB_BITS,
};

use crate::coo::SparseTensor;
use crate::error::{HiCooError, SparseError, SparseResult};

/// Default block bits: blocks of 128 coordinates per mode.
pub const DEFAULT_SB_BITS: u32 = 7;

/// Checks that `sb_bits` offsets fit in [`ElementIndex`]
pub fn check_sb_bits(sb_bits: u32) -> Result<(), HiCooError> {
    if sb_bits > MAX_SB_BITS {
        return Err(HiCooError::BlockSizeTooLarge {
            sb_bits,
            max: MAX_SB_BITS,
        });
    }
    Ok(())
}

/// Mask selecting the in-block offset of a coordinate
#[inline]
pub(crate) fn offset_mask(sb_bits: u32) -> Index {
    (1 << sb_bits) - 1
}

/// Encoding parameters for HiCOO tensors
///
/// Choosing `sb_bits` is left to the caller; there is no automatic tuning
/// from tensor density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HiCooConfig {
    /// Block size is `2^sb_bits` along every mode
    pub sb_bits: u32,
}

impl Default for HiCooConfig {
    fn default() -> Self {
        Self {
            sb_bits: DEFAULT_SB_BITS,
        }
    }
}

impl HiCooConfig {
    /// Set the block bits
    pub fn with_sb_bits(mut self, sb_bits: u32) -> Self {
        self.sb_bits = sb_bits;
        self
    }

    /// Block edge length
    pub fn block_size(&self) -> usize {
        1usize << self.sb_bits
    }

    /// Check the configuration against the offset type
    pub fn validate(&self) -> SparseResult<()> {
        check_sb_bits(self.sb_bits)?;
        Ok(())
    }
}

/// HiCOO (Hierarchical COO) tensor
///
/// # Examples
///
/// ```
/// use sptensor_sparse::{HiCooTensor, SparseTensor};
///
/// let mut coo = SparseTensor::<f64>::new(vec![8, 8, 8]).unwrap();
/// coo.push(&[1, 1, 1], 5.0).unwrap();
/// coo.push(&[1, 1, 3], 2.0).unwrap();
/// coo.push(&[5, 5, 5], 9.0).unwrap();
///
/// let hicoo = HiCooTensor::from_sorted_coo(&coo, 2).unwrap();
/// assert_eq!(hicoo.num_blocks(), 2);
/// assert_eq!(hicoo.bptr(), &[0, 2, 3]);
///
/// let back = hicoo.to_coo().unwrap();
/// assert_eq!(back.pairs_sorted(), coo.pairs_sorted());
/// ```
#[derive(Debug, Clone)]
pub struct HiCooTensor<T> {
    /// Size of each mode
    ndims: Vec<Index>,
    /// Mode priority the source tensor was sorted by
    sortorder: Vec<usize>,
    /// Block size is `2^sb_bits`
    sb_bits: u32,
    /// Block pointers, length `nblocks + 1`
    bptr: NnzIndexVector,
    /// Block coordinates, `binds[mode][block]`
    binds: Vec<BlockIndexVector>,
    /// In-block offsets, `einds[mode][nonzero]`
    einds: Vec<ElementIndexVector>,
    /// Nonzero values
    values: ValueVector<T>,
}

impl<T: Float> HiCooTensor<T> {
    /// Encodes a COO tensor that is already in block order.
    ///
    /// A single scan: whenever the block coordinate tuple of a nonzero
    /// differs from the previous one a new block is opened. Input that is not
    /// block-sorted (see [`SparseTensor::sort_in_block_order`]) still encodes
    /// losslessly, but a block tuple may then be split over several blocks.
    ///
    /// # Errors
    ///
    /// `BlockSizeTooLarge` if `sb_bits` offsets do not fit in [`ElementIndex`].
    pub fn from_sorted_coo(coo: &SparseTensor<T>, sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        let nmodes = coo.nmodes();
        let nnz = coo.nnz();
        let inds = coo.inds();
        let mask = offset_mask(sb_bits);

        let mut bptr = NnzIndexVector::new();
        let mut binds: Vec<BlockIndexVector> = (0..nmodes).map(|_| BlockIndexVector::new()).collect();
        let mut einds = (0..nmodes)
            .map(|_| ElementIndexVector::with_capacity(nnz))
            .collect::<CoreResult<Vec<_>>>()?;
        let mut values = ValueVector::with_capacity(nnz)?;

        bptr.append(0)?;
        let mut current: Option<BlockCoords> = None;
        let mut key = BlockCoords::with_capacity(nmodes);
        for (i, &value) in coo.values().iter().enumerate() {
            key.clear();
            key.extend(inds.iter().map(|mode_inds| mode_inds[i] >> sb_bits));

            if current.as_ref() != Some(&key) {
                if current.is_some() {
                    bptr.append(i)?;
                }
                for (mode_binds, &b) in binds.iter_mut().zip(&key) {
                    mode_binds.append(b)?;
                }
                current = Some(key.clone());
            }

            for (mode_einds, mode_inds) in einds.iter_mut().zip(inds) {
                mode_einds.append((mode_inds[i] & mask) as ElementIndex)?;
            }
            values.append(value)?;
        }
        if nnz > 0 {
            bptr.append(nnz)?;
        }

        let hicoo = Self {
            ndims: coo.ndims().to_vec(),
            sortorder: coo.sortorder().to_vec(),
            sb_bits,
            bptr,
            binds,
            einds,
            values,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nnz,
            nblocks = hicoo.num_blocks(),
            sb_bits,
            "encoded HiCOO tensor"
        );
        Ok(hicoo)
    }

    /// Encodes any COO tensor, sorting a copy into block order first.
    ///
    /// # Complexity
    ///
    /// O(nnz × log(nnz)) for sorting + O(nnz) for grouping into blocks
    pub fn from_coo(coo: &SparseTensor<T>, sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        let mut sorted = coo.clone();
        sorted.sort_in_block_order(sb_bits)?;
        Self::from_sorted_coo(&sorted, sb_bits)
    }

    /// Encodes with an explicit configuration
    pub fn with_config(coo: &SparseTensor<T>, config: &HiCooConfig) -> SparseResult<Self> {
        config.validate()?;
        Self::from_coo(coo, config.sb_bits)
    }

    /// Decodes back to COO.
    ///
    /// Nonzeros come out in storage (block) order and the result carries the
    /// source tensor's sort order. For every valid input,
    /// `from_coo(t, b)?.to_coo()?` holds exactly the nonzeros of `t`.
    pub fn to_coo(&self) -> SparseResult<SparseTensor<T>> {
        let nnz = self.nnz();
        let mut inds: Vec<Vec<Index>> = (0..self.nmodes()).map(|_| Vec::with_capacity(nnz)).collect();

        for b in 0..self.num_blocks() {
            let range = self.block_range(b);
            for (m, mode_inds) in inds.iter_mut().enumerate() {
                let base = self.binds[m][b] << self.sb_bits;
                mode_inds.extend(self.einds[m][range.clone()].iter().map(|&e| base | e as Index));
            }
        }

        let mut coo = SparseTensor::from_parts(self.ndims.clone(), inds, self.values.to_vec())?;
        coo.set_sortorder(self.sortorder.clone());

        #[cfg(feature = "tracing")]
        tracing::debug!(nnz, nblocks = self.num_blocks(), "decoded HiCOO tensor");
        Ok(coo)
    }

    /// Returns the number of modes.
    #[inline]
    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    /// Returns the size of each mode.
    #[inline]
    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    /// Returns the sort order inherited from the source tensor.
    #[inline]
    pub fn sortorder(&self) -> &[usize] {
        &self.sortorder
    }

    /// Returns the number of nonzeros.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns the block bits.
    #[inline]
    pub fn sb_bits(&self) -> u32 {
        self.sb_bits
    }

    /// Returns the block edge length `2^sb_bits`.
    #[inline]
    pub fn block_size(&self) -> usize {
        1usize << self.sb_bits
    }

    /// Returns the number of blocks.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.bptr.len().saturating_sub(1)
    }

    /// Returns the block pointers.
    #[inline]
    pub fn bptr(&self) -> &[NnzIndex] {
        &self.bptr
    }

    /// Returns the block coordinates along `mode`.
    pub fn binds(&self, mode: usize) -> SparseResult<&[BlockIndex]> {
        self.binds
            .get(mode)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    /// Returns the in-block offsets along `mode`.
    pub fn einds(&self, mode: usize) -> SparseResult<&[ElementIndex]> {
        self.einds
            .get(mode)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns a mutable reference to the values.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        self.values.as_mut_slice()
    }

    #[inline]
    fn block_range(&self, b: usize) -> Range<usize> {
        self.bptr[b]..self.bptr[b + 1]
    }

    /// Read-only view of block `b`.
    pub fn block(&self, b: usize) -> SparseResult<HiCooBlock<'_, T>> {
        if b >= self.num_blocks() {
            return Err(CoreError::out_of_range(b, self.num_blocks()).into());
        }
        Ok(HiCooBlock {
            tensor: self,
            index: b,
        })
    }

    /// Iterates over all blocks in storage order.
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = HiCooBlock<'_, T>> + '_ {
        (0..self.num_blocks()).map(move |index| HiCooBlock {
            tensor: self,
            index,
        })
    }

    /// Iterates over all nonzeros as (coordinates, value) tuples.
    ///
    /// Yields in block-major storage order.
    ///
    /// # Complexity
    ///
    /// O(nnz × nmodes)
    pub fn iter(&self) -> HiCooIterator<'_, T> {
        HiCooIterator {
            hicoo: self,
            block: 0,
            pos: 0,
        }
    }

    /// Checks every structural invariant of the encoding.
    ///
    /// - `bptr[0] == 0`, `bptr[nblocks] == nnz`, `bptr` non-decreasing
    /// - `binds[m]` has `nblocks` entries, `einds[m]` has `nnz` entries
    /// - every offset is `< 2^sb_bits`
    /// - every rebuilt coordinate is inside `ndims`
    pub fn validate(&self) -> SparseResult<()> {
        check_sb_bits(self.sb_bits)?;
        let nnz = self.nnz();
        let nblocks = self.num_blocks();

        if self.bptr.first() != Some(&0) {
            return Err(SparseError::corrupt("bptr must start at 0"));
        }
        if self.bptr.last() != Some(&nnz) {
            return Err(SparseError::corrupt(format!("bptr must end at nnz = {}", nnz)));
        }
        if let Some(pos) = self.bptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(SparseError::corrupt(format!("bptr decreases at block {}", pos)));
        }
        if self.binds.len() != self.nmodes() || self.einds.len() != self.nmodes() {
            return Err(SparseError::corrupt("per-mode arrays do not match nmodes"));
        }
        for m in 0..self.nmodes() {
            if self.binds[m].len() != nblocks {
                return Err(SparseError::corrupt(format!(
                    "binds[{}] has {} entries, expected {}",
                    m,
                    self.binds[m].len(),
                    nblocks
                )));
            }
            if self.einds[m].len() != nnz {
                return Err(SparseError::corrupt(format!(
                    "einds[{}] has {} entries, expected {}",
                    m,
                    self.einds[m].len(),
                    nnz
                )));
            }
            if self.einds[m].iter().any(|&e| usize::from(e) >= self.block_size()) {
                return Err(SparseError::corrupt(format!(
                    "einds[{}] holds an offset >= block size {}",
                    m,
                    self.block_size()
                )));
            }
        }
        for (coords, _) in self.iter() {
            if coords.iter().zip(&self.ndims).any(|(&c, &d)| c >= d) {
                return Err(SparseError::index_out_of_bounds(
                    coords.to_vec(),
                    self.ndims.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Returns the density (nnz / total elements).
    pub fn density(&self) -> f64 {
        let total: f64 = self.ndims.iter().map(|&d| d as f64).product();
        self.nnz() as f64 / total
    }

    /// Bytes used by block pointers, block coordinates, offsets and values.
    pub fn storage_bytes(&self) -> usize {
        let nmodes = self.nmodes();
        self.bptr.len() * std::mem::size_of::<NnzIndex>()
            + nmodes * self.num_blocks() * std::mem::size_of::<BlockIndex>()
            + nmodes * self.nnz() * std::mem::size_of::<ElementIndex>()
            + self.nnz() * std::mem::size_of::<T>()
    }

    /// Converts HiCOO to a dense array.
    ///
    /// # Complexity
    ///
    /// O(nnz + total_elements)
    pub fn to_dense(&self) -> ArrayD<T> {
        let shape: Vec<usize> = self.ndims.iter().map(|&d| to_usize(d)).collect();
        let mut dense = ArrayD::zeros(shape);
        for (coords, value) in self.iter() {
            let idx: Vec<usize> = coords.iter().map(|&c| to_usize(c)).collect();
            let cell = &mut dense[idx.as_slice()];
            *cell = *cell + value;
        }
        dense
    }
}

/// Read-only view of one HiCOO block
///
/// This is what parallel kernels receive when they traverse a tensor by
/// block ranges.
#[derive(Debug, Clone, Copy)]
pub struct HiCooBlock<'a, T> {
    tensor: &'a HiCooTensor<T>,
    index: usize,
}

impl<'a, T: Float> HiCooBlock<'a, T> {
    /// Position of the block in the tensor
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Range of nonzero positions owned by the block
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.tensor.block_range(self.index)
    }

    /// Number of nonzeros in the block
    #[inline]
    pub fn nnz(&self) -> usize {
        self.range().len()
    }

    /// Block coordinate along `mode`
    pub fn block_coord(&self, mode: usize) -> SparseResult<BlockIndex> {
        self.check_mode(mode)?;
        Ok(self.tensor.binds[mode][self.index])
    }

    /// Block coordinate tuple
    pub fn block_coords(&self) -> BlockCoords {
        self.tensor.binds.iter().map(|v| v[self.index]).collect()
    }

    /// In-block offsets of the block's nonzeros along `mode`
    pub fn einds(&self, mode: usize) -> SparseResult<&'a [ElementIndex]> {
        self.check_mode(mode)?;
        Ok(&self.tensor.einds[mode][self.range()])
    }

    /// Values of the block's nonzeros
    pub fn values(&self) -> &'a [T] {
        &self.tensor.values[self.range()]
    }

    /// Full coordinate along `mode` of the `k`-th nonzero of the block
    pub fn coord(&self, mode: usize, k: usize) -> SparseResult<Index> {
        self.check_mode(mode)?;
        let nnz = self.nnz();
        if k >= nnz {
            return Err(CoreError::out_of_range(k, nnz).into());
        }
        Ok(self.coord_unchecked(mode, k))
    }

    /// Iterates over the block's nonzeros as (coordinates, value) tuples
    pub fn iter(&self) -> impl Iterator<Item = (Coords, T)> + 'a {
        let block = *self;
        (0..block.nnz()).map(move |k| {
            let coords = (0..block.tensor.nmodes())
                .map(|m| block.coord_unchecked(m, k))
                .collect();
            (coords, block.values()[k])
        })
    }

    /// `mode < nmodes` and `k < nnz` are the caller's responsibility
    #[inline]
    fn coord_unchecked(&self, mode: usize, k: usize) -> Index {
        let i = self.tensor.bptr[self.index] + k;
        (self.tensor.binds[mode][self.index] << self.tensor.sb_bits)
            | self.tensor.einds[mode][i] as Index
    }

    fn check_mode(&self, mode: usize) -> SparseResult<()> {
        let nmodes = self.tensor.nmodes();
        if mode >= nmodes {
            return Err(SparseError::invalid_mode(mode, nmodes));
        }
        Ok(())
    }
}

/// Iterator over HiCOO tensor nonzeros
///
/// Yields (coordinates, value) tuples in block-major order (better cache locality).
pub struct HiCooIterator<'a, T> {
    hicoo: &'a HiCooTensor<T>,
    /// Current block
    block: usize,
    /// Current value index
    pos: usize,
}

impl<'a, T: Float> Iterator for HiCooIterator<'a, T> {
    type Item = (Coords, T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.hicoo.nnz() {
            return None;
        }
        // Skip empty blocks
        while self.hicoo.bptr[self.block + 1] <= self.pos {
            self.block += 1;
        }

        let hicoo = self.hicoo;
        let coords: Coords = (0..hicoo.nmodes())
            .map(|m| (hicoo.binds[m][self.block] << hicoo.sb_bits) | hicoo.einds[m][self.pos] as Index)
            .collect();
        let value = hicoo.values[self.pos];

        self.pos += 1;
        Some((coords, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.hicoo.nnz() - self.pos;
        (remaining, Some(remaining))
    }
}

impl<'a, T: Float> ExactSizeIterator for HiCooIterator<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IndexError, ValidationError};

    fn paper_example() -> SparseTensor<f64> {
        SparseTensor::from_coords(
            vec![8, 8, 8],
            &[vec![1, 1, 1], vec![1, 1, 3], vec![5, 5, 5]],
            &[5.0, 2.0, 9.0],
        )
        .unwrap()
    }

    #[test]
    fn test_hicoo_two_block_example() {
        let hicoo = HiCooTensor::from_sorted_coo(&paper_example(), 2).unwrap();

        assert_eq!(hicoo.nnz(), 3);
        assert_eq!(hicoo.num_blocks(), 2);
        assert_eq!(hicoo.block_size(), 4);
        assert_eq!(hicoo.bptr(), &[0, 2, 3]);
        for m in 0..3 {
            assert_eq!(hicoo.binds(m).unwrap(), &[0, 1]);
        }
        assert_eq!(hicoo.einds(0).unwrap(), &[1, 1, 1]);
        assert_eq!(hicoo.einds(1).unwrap(), &[1, 1, 1]);
        assert_eq!(hicoo.einds(2).unwrap(), &[1, 3, 1]);
        assert_eq!(hicoo.values(), &[5.0, 2.0, 9.0]);
        hicoo.validate().unwrap();
    }

    #[test]
    fn test_hicoo_block_size_too_large() {
        let coo = paper_example();
        let err = HiCooTensor::from_sorted_coo(&coo, 9).unwrap_err();
        assert!(matches!(
            err,
            SparseError::HiCoo(HiCooError::BlockSizeTooLarge { sb_bits: 9, max: 8 })
        ));
        assert!(HiCooTensor::from_coo(&coo, 32).is_err());
        assert!(HiCooTensor::from_sorted_coo(&coo, MAX_SB_BITS).is_ok());
    }

    #[test]
    fn test_hicoo_empty_tensor() {
        let coo = SparseTensor::<f64>::new(vec![8, 8, 8]).unwrap();
        let hicoo = HiCooTensor::from_coo(&coo, 3).unwrap();

        assert_eq!(hicoo.nnz(), 0);
        assert_eq!(hicoo.num_blocks(), 0);
        assert_eq!(hicoo.bptr(), &[0]);
        hicoo.validate().unwrap();

        let back = hicoo.to_coo().unwrap();
        assert_eq!(back.nnz(), 0);
        assert_eq!(back.ndims(), &[8, 8, 8]);
    }

    #[test]
    fn test_hicoo_to_coo_roundtrip() {
        let coo = SparseTensor::from_coords(
            vec![300, 20, 1000],
            &[vec![299, 0, 999], vec![0, 19, 0], vec![130, 7, 512], vec![131, 7, 513]],
            &[1.0, -2.0, 3.5, 4.25],
        )
        .unwrap();

        for sb_bits in 0..=MAX_SB_BITS {
            let hicoo = HiCooTensor::from_coo(&coo, sb_bits).unwrap();
            hicoo.validate().unwrap();
            let back = hicoo.to_coo().unwrap();
            assert_eq!(back.ndims(), coo.ndims());
            assert_eq!(back.sortorder(), coo.sortorder());
            assert_eq!(back.pairs_sorted(), coo.pairs_sorted());
        }
    }

    #[test]
    fn test_hicoo_unsorted_input_still_lossless() {
        // Lexicographic order visits block (0,1) twice around block (0,0)
        let mut coo = SparseTensor::from_coords(
            vec![8, 8],
            &[vec![0, 5], vec![1, 0], vec![1, 6]],
            &[1.0, 2.0, 3.0],
        )
        .unwrap();
        coo.sort();

        let split = HiCooTensor::from_sorted_coo(&coo, 2).unwrap();
        assert_eq!(split.num_blocks(), 3);
        assert_eq!(split.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());

        let grouped = HiCooTensor::from_coo(&coo, 2).unwrap();
        assert_eq!(grouped.num_blocks(), 2);
        assert_eq!(grouped.bptr(), &[0, 1, 3]);
    }

    #[test]
    fn test_hicoo_iteration_and_blocks() {
        let hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        let nonzeros: Vec<_> = hicoo.iter().collect();
        assert_eq!(nonzeros.len(), 3);
        assert_eq!(nonzeros[2].0.as_slice(), &[5, 5, 5]);

        let blocks: Vec<_> = hicoo.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].nnz(), 2);
        assert_eq!(blocks[1].block_coords().as_slice(), &[1, 1, 1]);
        assert_eq!(blocks[0].einds(2).unwrap(), &[1, 3]);
        assert_eq!(blocks[0].coord(2, 1).unwrap(), 3);
        assert_eq!(blocks[1].values(), &[9.0]);

        let in_block: Vec<_> = blocks[0].iter().collect();
        assert_eq!(in_block[1].0.as_slice(), &[1, 1, 3]);
        assert_eq!(in_block[1].1, 2.0);

        assert!(hicoo.block(2).is_err());
        assert!(hicoo.binds(3).is_err());
    }

    #[test]
    fn test_block_accessors_out_of_range() {
        let hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        let block = hicoo.block(0).unwrap();

        assert_eq!(block.block_coord(0).unwrap(), 0);
        assert!(matches!(
            block.block_coord(3),
            Err(SparseError::Validation(ValidationError::InvalidMode { mode: 3, nmodes: 3 }))
        ));
        assert!(block.einds(3).is_err());
        assert!(block.coord(3, 0).is_err());
        assert!(matches!(
            block.coord(0, 2),
            Err(SparseError::Core(CoreError::IndexOutOfRange { index: 2, len: 2 }))
        ));
    }

    #[test]
    fn test_hicoo_validate_detects_corruption() {
        let mut hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        hicoo.bptr.as_mut_slice()[1] = 4;
        assert!(hicoo.validate().is_err());

        let mut hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        hicoo.binds[0].as_mut_slice()[1] = 2;
        assert!(matches!(
            hicoo.validate(),
            Err(SparseError::Index(IndexError::OutOfBounds { .. }))
        ));

        let mut hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        hicoo.einds[1].as_mut_slice()[0] = 4;
        assert!(hicoo.validate().is_err());
    }

    #[test]
    fn test_hicoo_to_dense() {
        let hicoo = HiCooTensor::from_coo(&paper_example(), 2).unwrap();
        let dense = hicoo.to_dense();
        assert_eq!(dense[[1, 1, 1]], 5.0);
        assert_eq!(dense[[5, 5, 5]], 9.0);
        assert_eq!(dense[[0, 1, 0]], 0.0);
    }

    #[test]
    fn test_hicoo_storage_smaller_for_clustered_nonzeros() {
        let mut coo = SparseTensor::<f64>::new(vec![64, 64, 64]).unwrap();
        for i in 0..8 {
            for j in 0..8 {
                coo.push(&[i, j, (i + j) % 8], 1.0).unwrap();
            }
        }
        let hicoo = HiCooTensor::from_coo(&coo, 3).unwrap();
        assert_eq!(hicoo.num_blocks(), 1);
        assert!(hicoo.storage_bytes() < coo.storage_bytes());
    }

    #[test]
    fn test_config_validation() {
        let config = HiCooConfig::default();
        assert_eq!(config.block_size(), 128);
        assert!(config.validate().is_ok());
        assert!(HiCooConfig::default().with_sb_bits(12).validate().is_err());

        let hicoo = HiCooTensor::with_config(&paper_example(), &config.with_sb_bits(2)).unwrap();
        assert_eq!(hicoo.num_blocks(), 2);
    }
}
