//! Generalized HiCOO: hierarchical compression of a subset of modes
//!
//! Only modes flagged for compression are split into block coordinates and
//! narrow in-block offsets; the remaining modes keep their full-width
//! coordinate for every nonzero. Blocks are formed from the compressed modes
//! alone, so a block holds every nonzero that shares the compressed block
//! tuple, whatever its plain-mode coordinates.
//!
//! Each mode carries its own representation as a [`ModeIndex`], so the
//! per-mode arrays cannot disagree with the compression flags: `flags()` and
//! `ncmodes()` are derived from the modes themselves.
//!
//! # Example
//!
//! ```
//! use sptensor_sparse::{HiCooGeneral, SparseTensor};
//!
//! let coo = SparseTensor::from_coords(
//!     vec![8, 8, 100],
//!     &[vec![1, 1, 40], vec![1, 2, 99], vec![6, 6, 0]],
//!     &[1.0, 2.0, 3.0],
//! )
//! .unwrap();
//!
//! // Compress modes 0 and 1, keep mode 2 plain
//! let hg = HiCooGeneral::from_coo(&coo, &[true, true, false], 2).unwrap();
//! assert_eq!(hg.ncmodes(), 2);
//! assert_eq!(hg.num_blocks(), 2);
//! assert_eq!(hg.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());
//! ```

use std::ops::Range;

use scirs2_core::numeric::Float;
use sptensor_core::{
    BlockCoords, BlockIndex, BlockIndexVector, Coords, CoreResult, ElementIndex,
    ElementIndexVector, Index, IndexVector, NnzIndex, NnzIndexVector, ValueVector,
};

use crate::coo::{check_flags, SparseTensor};
use crate::error::{SparseError, SparseResult};
use crate::hicoo::{check_sb_bits, offset_mask};

/// Storage of one mode of a [`HiCooGeneral`] tensor
#[derive(Debug, Clone, PartialEq)]
pub enum ModeIndex {
    /// Block coordinate per block, narrow offset per nonzero
    Compressed {
        binds: BlockIndexVector,
        einds: ElementIndexVector,
    },
    /// Full-width coordinate per nonzero
    Plain { inds: IndexVector },
}

impl ModeIndex {
    fn compressed(nnz: usize) -> CoreResult<Self> {
        Ok(ModeIndex::Compressed {
            binds: BlockIndexVector::new(),
            einds: ElementIndexVector::with_capacity(nnz)?,
        })
    }

    fn plain(nnz: usize) -> CoreResult<Self> {
        Ok(ModeIndex::Plain {
            inds: IndexVector::with_capacity(nnz)?,
        })
    }

    /// Returns `true` for a compressed mode.
    pub fn is_compressed(&self) -> bool {
        matches!(self, ModeIndex::Compressed { .. })
    }

    /// Full coordinate of nonzero `i`, which lives in block `b`
    #[inline]
    fn coord(&self, sb_bits: u32, b: usize, i: usize) -> Index {
        match self {
            ModeIndex::Compressed { binds, einds } => (binds[b] << sb_bits) | einds[i] as Index,
            ModeIndex::Plain { inds } => inds[i],
        }
    }

    fn per_nonzero_len(&self) -> usize {
        match self {
            ModeIndex::Compressed { einds, .. } => einds.len(),
            ModeIndex::Plain { inds } => inds.len(),
        }
    }
}

/// HiCOO tensor with per-mode compression
#[derive(Debug, Clone)]
pub struct HiCooGeneral<T> {
    ndims: Vec<Index>,
    /// Compressed modes first, then plain modes
    sortorder: Vec<usize>,
    sb_bits: u32,
    bptr: NnzIndexVector,
    modes: Vec<ModeIndex>,
    values: ValueVector<T>,
}

impl<T: Float> HiCooGeneral<T> {
    /// Encodes a COO tensor already sorted with
    /// [`SparseTensor::sort_in_mode_block_order`] for the same flags.
    ///
    /// # Errors
    ///
    /// - `ModeFlagMismatch` if `flags` does not have one entry per mode
    /// - `BlockSizeTooLarge` if `sb_bits` offsets do not fit in [`ElementIndex`]
    pub fn from_sorted_coo(coo: &SparseTensor<T>, flags: &[bool], sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        check_flags(flags, coo.nmodes())?;
        let nnz = coo.nnz();
        let inds = coo.inds();
        let mask = offset_mask(sb_bits);
        let cmodes: Vec<usize> = (0..coo.nmodes()).filter(|&m| flags[m]).collect();

        let mut modes = flags
            .iter()
            .map(|&c| if c { ModeIndex::compressed(nnz) } else { ModeIndex::plain(nnz) })
            .collect::<CoreResult<Vec<_>>>()?;
        let mut bptr = NnzIndexVector::new();
        let mut values = ValueVector::with_capacity(nnz)?;

        bptr.append(0)?;
        let mut current: Option<BlockCoords> = None;
        let mut key = BlockCoords::with_capacity(cmodes.len());
        for (i, &value) in coo.values().iter().enumerate() {
            key.clear();
            key.extend(cmodes.iter().map(|&m| inds[m][i] >> sb_bits));
            let new_block = current.as_ref() != Some(&key);
            if new_block && current.is_some() {
                bptr.append(i)?;
            }

            for (mode, mode_inds) in modes.iter_mut().zip(inds) {
                let c = mode_inds[i];
                match mode {
                    ModeIndex::Compressed { binds, einds } => {
                        if new_block {
                            binds.append(c >> sb_bits)?;
                        }
                        einds.append((c & mask) as ElementIndex)?;
                    }
                    ModeIndex::Plain { inds } => inds.append(c)?,
                }
            }
            if new_block {
                current = Some(key.clone());
            }
            values.append(value)?;
        }
        if nnz > 0 {
            bptr.append(nnz)?;
        }

        let plain = coo.sortorder().iter().copied().filter(|&m| !flags[m]);
        let sortorder = coo
            .sortorder()
            .iter()
            .copied()
            .filter(|&m| flags[m])
            .chain(plain)
            .collect();

        let hg = Self {
            ndims: coo.ndims().to_vec(),
            sortorder,
            sb_bits,
            bptr,
            modes,
            values,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nnz,
            nblocks = hg.num_blocks(),
            ncmodes = hg.ncmodes(),
            sb_bits,
            "encoded generalized HiCOO tensor"
        );
        Ok(hg)
    }

    /// Encodes any COO tensor, sorting a copy into the matching block order.
    pub fn from_coo(coo: &SparseTensor<T>, flags: &[bool], sb_bits: u32) -> SparseResult<Self> {
        check_sb_bits(sb_bits)?;
        check_flags(flags, coo.nmodes())?;
        let mut sorted = coo.clone();
        sorted.sort_in_mode_block_order(sb_bits, flags)?;
        Self::from_sorted_coo(&sorted, flags, sb_bits)
    }

    /// Decodes back to COO, keeping the storage order.
    ///
    /// The result's sort order lists compressed modes before plain ones.
    pub fn to_coo(&self) -> SparseResult<SparseTensor<T>> {
        let nnz = self.nnz();
        let mut inds: Vec<Vec<Index>> = (0..self.nmodes()).map(|_| Vec::with_capacity(nnz)).collect();
        for b in 0..self.num_blocks() {
            for i in self.block_range(b) {
                for (mode_inds, mode) in inds.iter_mut().zip(&self.modes) {
                    mode_inds.push(mode.coord(self.sb_bits, b, i));
                }
            }
        }
        let mut coo = SparseTensor::from_parts(self.ndims.clone(), inds, self.values.to_vec())?;
        coo.set_sortorder(self.sortorder.clone());

        #[cfg(feature = "tracing")]
        tracing::debug!(nnz, nblocks = self.num_blocks(), "decoded generalized HiCOO tensor");
        Ok(coo)
    }

    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    pub fn sortorder(&self) -> &[usize] {
        &self.sortorder
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn sb_bits(&self) -> u32 {
        self.sb_bits
    }

    pub fn num_blocks(&self) -> usize {
        self.bptr.len().saturating_sub(1)
    }

    pub fn bptr(&self) -> &[NnzIndex] {
        &self.bptr
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Compression flag of every mode
    pub fn flags(&self) -> Vec<bool> {
        self.modes.iter().map(ModeIndex::is_compressed).collect()
    }

    /// Number of compressed modes
    pub fn ncmodes(&self) -> usize {
        self.modes.iter().filter(|m| m.is_compressed()).count()
    }

    /// Storage of `mode`
    pub fn mode(&self, mode: usize) -> SparseResult<&ModeIndex> {
        self.modes
            .get(mode)
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    /// Block coordinates along a compressed mode; `None` for plain modes
    pub fn binds(&self, mode: usize) -> SparseResult<Option<&[BlockIndex]>> {
        Ok(match self.mode(mode)? {
            ModeIndex::Compressed { binds, .. } => Some(binds.as_slice()),
            ModeIndex::Plain { .. } => None,
        })
    }

    fn block_range(&self, b: usize) -> Range<usize> {
        self.bptr[b]..self.bptr[b + 1]
    }

    /// Iterates over nonzeros as (coordinates, value) in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Coords, T)> + '_ {
        (0..self.num_blocks()).flat_map(move |b| {
            self.block_range(b).map(move |i| {
                let coords = self.modes.iter().map(|m| m.coord(self.sb_bits, b, i)).collect();
                (coords, self.values[i])
            })
        })
    }

    /// Checks block pointers, per-mode lengths and coordinate bounds.
    pub fn validate(&self) -> SparseResult<()> {
        check_sb_bits(self.sb_bits)?;
        let nnz = self.nnz();
        let nblocks = self.num_blocks();
        if self.bptr.first() != Some(&0) || self.bptr.last() != Some(&nnz) {
            return Err(SparseError::corrupt(format!("bptr must span 0..{}", nnz)));
        }
        if self.bptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::corrupt("bptr is not monotone"));
        }
        for (m, mode) in self.modes.iter().enumerate() {
            if mode.per_nonzero_len() != nnz {
                return Err(SparseError::corrupt(format!("mode {} does not cover every nonzero", m)));
            }
            if let ModeIndex::Compressed { binds, einds } = mode {
                if binds.len() != nblocks {
                    return Err(SparseError::corrupt(format!("binds[{}] does not cover every block", m)));
                }
                if einds.iter().any(|&e| Index::from(e) > offset_mask(self.sb_bits)) {
                    return Err(SparseError::corrupt(format!("einds[{}] exceeds the block size", m)));
                }
            }
        }
        for (coords, _) in self.iter() {
            if coords.iter().zip(&self.ndims).any(|(&c, &d)| c >= d) {
                return Err(SparseError::index_out_of_bounds(coords.to_vec(), self.ndims.clone()));
            }
        }
        Ok(())
    }

    /// Bytes used by block pointers, per-mode indices and values.
    pub fn storage_bytes(&self) -> usize {
        let index_bytes: usize = self
            .modes
            .iter()
            .map(|mode| match mode {
                ModeIndex::Compressed { binds, einds } => {
                    binds.len() * std::mem::size_of::<BlockIndex>()
                        + einds.len() * std::mem::size_of::<ElementIndex>()
                }
                ModeIndex::Plain { inds } => inds.len() * std::mem::size_of::<Index>(),
            })
            .sum();
        self.bptr.len() * std::mem::size_of::<NnzIndex>()
            + index_bytes
            + self.nnz() * std::mem::size_of::<T>()
    }
}
