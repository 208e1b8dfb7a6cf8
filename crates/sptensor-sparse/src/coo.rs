//! COO (Coordinate) sparse tensor format
//!
//! The coordinate format is the canonical, uncompressed representation of a
//! sparse tensor and the source and target of every conversion in this crate.
//!
//! # Format
//!
//! For an N-mode sparse tensor with `nnz` nonzeros:
//! - `ndims`: size of each mode
//! - `inds`: one [`IndexVector`] per mode, each of length `nnz`
//! - `values`: the nonzero values, index-aligned with `inds`
//! - `sortorder`: the mode priority nonzeros are (or will be) sorted by
//!
//! Storage is columnar: `inds[m][i]` is the mode-`m` coordinate of nonzero `i`.
//! A tensor is semantically the multiset of its `(coordinates, value)` pairs;
//! the physical order only matters to encoders, which expect a
//! block-compatible order (see [`SparseTensor::sort_in_block_order`]).
//!
//! # Examples
//!
//! ```
//! use sptensor_sparse::SparseTensor;
//!
//! let mut coo = SparseTensor::<f64>::new(vec![8, 8, 8]).unwrap();
//! coo.push(&[5, 5, 5], 9.0).unwrap();
//! coo.push(&[1, 1, 3], 2.0).unwrap();
//! coo.push(&[1, 1, 1], 5.0).unwrap();
//!
//! coo.sort();
//! assert_eq!(coo.mode_indices(2).unwrap(), &[1, 3, 5]);
//! assert_eq!(coo.values(), &[5.0, 2.0, 9.0]);
//! ```

use std::cmp::Ordering;

use scirs2_core::ndarray_ext::ArrayD;
use scirs2_core::numeric::Float;
use sptensor_core::{to_usize, Coords, CoreError, Index, IndexVector, ValueVector};

use crate::error::{IndexError, SparseError, SparseResult, ValidationError};
use crate::hicoo::check_sb_bits;

/// COO (Coordinate) sparse tensor
///
/// Stores one coordinate array per mode plus a value array.
/// Flexible and easy to construct; the input of every compressed format.
#[derive(Debug, Clone)]
pub struct SparseTensor<T> {
    /// Size of each mode
    ndims: Vec<Index>,
    /// Mode priority used when sorting
    sortorder: Vec<usize>,
    /// Coordinates, `inds[mode][nonzero]`
    inds: Vec<IndexVector>,
    /// Nonzero values
    values: ValueVector<T>,
}

impl<T: Float> SparseTensor<T> {
    /// Create an empty tensor with the given mode sizes
    ///
    /// # Errors
    ///
    /// Returns error if `ndims` is empty or contains zeros.
    pub fn new(ndims: Vec<Index>) -> SparseResult<Self> {
        validate_ndims(&ndims)?;
        let nmodes = ndims.len();
        Ok(Self {
            sortorder: (0..nmodes).collect(),
            inds: (0..nmodes).map(|_| IndexVector::new()).collect(),
            values: ValueVector::new(),
            ndims,
        })
    }

    /// Create a tensor from per-nonzero coordinate tuples
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - coordinates and values have different lengths
    /// - a coordinate tuple has the wrong number of modes
    /// - any coordinate is out of bounds
    pub fn from_coords(
        ndims: Vec<Index>,
        coords: &[Vec<Index>],
        values: &[T],
    ) -> SparseResult<Self> {
        if coords.len() != values.len() {
            return Err(ValidationError::LengthMismatch {
                indices: coords.len(),
                values: values.len(),
            }
            .into());
        }
        let mut tensor = Self::new(ndims)?;
        for (c, &v) in coords.iter().zip(values) {
            tensor.push(c, v)?;
        }
        Ok(tensor)
    }

    /// Create a tensor from columnar parts, `inds[mode][nonzero]`
    pub fn from_parts(
        ndims: Vec<Index>,
        inds: Vec<Vec<Index>>,
        values: Vec<T>,
    ) -> SparseResult<Self> {
        validate_ndims(&ndims)?;
        if inds.len() != ndims.len() {
            return Err(ValidationError::ShapeDimsMismatch {
                expected: ndims.len(),
                got: inds.len(),
            }
            .into());
        }
        for mode_inds in &inds {
            if mode_inds.len() != values.len() {
                return Err(ValidationError::LengthMismatch {
                    indices: mode_inds.len(),
                    values: values.len(),
                }
                .into());
            }
        }
        for (mode_inds, &dim) in inds.iter().zip(&ndims) {
            if let Some(pos) = mode_inds.iter().position(|&c| c >= dim) {
                let index = inds.iter().map(|v| v[pos]).collect();
                return Err(SparseError::index_out_of_bounds(index, ndims.clone()));
            }
        }

        Ok(Self {
            sortorder: (0..ndims.len()).collect(),
            inds: inds.into_iter().map(IndexVector::from_vec).collect(),
            values: ValueVector::from_vec(values),
            ndims,
        })
    }

    /// Number of modes
    #[inline]
    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    /// Size of each mode
    #[inline]
    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    /// Mode priority used by [`sort`](Self::sort)
    #[inline]
    pub fn sortorder(&self) -> &[usize] {
        &self.sortorder
    }

    /// Number of nonzeros
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Coordinate arrays of every mode
    #[inline]
    pub fn inds(&self) -> &[IndexVector] {
        &self.inds
    }

    /// Coordinates of every nonzero along `mode`
    pub fn mode_indices(&self, mode: usize) -> SparseResult<&[Index]> {
        self.inds
            .get(mode)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    /// Nonzero values
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable nonzero values
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        self.values.as_mut_slice()
    }

    /// Coordinates of nonzero `i`
    #[inline]
    pub(crate) fn coords_at(&self, i: usize) -> Coords {
        self.inds.iter().map(|v| v[i]).collect()
    }

    /// Bounds-checked access to one nonzero
    pub fn entry(&self, i: usize) -> SparseResult<(Coords, T)> {
        if i >= self.nnz() {
            return Err(CoreError::out_of_range(i, self.nnz()).into());
        }
        Ok((self.coords_at(i), self.values[i]))
    }

    /// Iterates over `(coordinates, value)` pairs in storage order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Coords, T)> + '_ {
        (0..self.nnz()).map(move |i| (self.coords_at(i), self.values[i]))
    }

    /// Add a nonzero
    ///
    /// Note: Does not check for duplicates. Use `deduplicate()` after construction.
    pub fn push(&mut self, coords: &[Index], value: T) -> SparseResult<()> {
        if coords.len() != self.nmodes() {
            return Err(IndexError::DimensionMismatch {
                expected: self.nmodes(),
                got: coords.len(),
            }
            .into());
        }
        if coords.iter().zip(&self.ndims).any(|(&c, &d)| c >= d) {
            return Err(SparseError::index_out_of_bounds(
                coords.to_vec(),
                self.ndims.clone(),
            ));
        }

        let nnz = self.nnz();
        let appended = coords
            .iter()
            .zip(self.inds.iter_mut())
            .try_for_each(|(&c, mode_inds)| mode_inds.append(c))
            .and_then(|()| self.values.append(value));
        if let Err(err) = appended {
            for mode_inds in &mut self.inds {
                mode_inds.truncate(nnz);
            }
            self.values.truncate(nnz);
            return Err(err.into());
        }
        Ok(())
    }

    /// Stable lexicographic sort with `order` as the mode priority
    ///
    /// All coordinate arrays and the values are permuted consistently, and
    /// `order` becomes the tensor's sort order.
    ///
    /// # Complexity
    ///
    /// O(nnz × log(nnz) × nmodes)
    pub fn sort_by_order(&mut self, order: &[usize]) -> SparseResult<()> {
        validate_mode_order(order, self.nmodes())?;
        self.sort_by_valid_order(order.to_vec());
        Ok(())
    }

    /// Sort lexicographically by the tensor's current sort order
    pub fn sort(&mut self) {
        let order = self.sortorder.clone();
        self.sort_by_valid_order(order);
    }

    /// `order` must be a permutation of `0..nmodes`
    fn sort_by_valid_order(&mut self, order: Vec<usize>) {
        let perm = {
            let inds = &self.inds;
            let mut perm: Vec<usize> = (0..self.nnz()).collect();
            perm.sort_by(|&a, &b| lexicographic_cmp(inds, &order, a, b));
            perm
        };
        self.apply_permutation(&perm);

        #[cfg(feature = "tracing")]
        tracing::debug!(nnz = self.nnz(), ?order, "sorted COO tensor");
        self.sortorder = order;
    }

    /// Sort into an order compatible with HiCOO blocking
    ///
    /// Nonzeros are ordered by their block coordinates (`index >> sb_bits`,
    /// in sort-order priority) and then by their full coordinates, so that
    /// all nonzeros sharing a block are contiguous.
    pub fn sort_in_block_order(&mut self, sb_bits: u32) -> SparseResult<()> {
        let flags = vec![true; self.nmodes()];
        self.sort_in_mode_block_order(sb_bits, &flags)
    }

    /// Block-compatible sort where only `compressed` modes are blocked
    ///
    /// Ordering: block coordinates of compressed modes, then full coordinates
    /// of compressed modes, then coordinates of the remaining modes.
    pub fn sort_in_mode_block_order(&mut self, sb_bits: u32, compressed: &[bool]) -> SparseResult<()> {
        check_sb_bits(sb_bits)?;
        check_flags(compressed, self.nmodes())?;
        let perm = {
            let inds = &self.inds;
            let order = &self.sortorder;
            let mut perm: Vec<usize> = (0..self.nnz()).collect();
            perm.sort_by(|&a, &b| block_order_cmp(inds, order, compressed, sb_bits, a, b));
            perm
        };
        self.apply_permutation(&perm);

        #[cfg(feature = "tracing")]
        tracing::debug!(nnz = self.nnz(), sb_bits, "sorted COO tensor in block order");
        Ok(())
    }

    /// Returns `true` if nonzeros are already in block order for `sb_bits`
    pub fn is_block_sorted(&self, sb_bits: u32) -> SparseResult<bool> {
        check_sb_bits(sb_bits)?;
        let flags = vec![true; self.nmodes()];
        Ok((1..self.nnz()).all(|i| {
            block_order_cmp(&self.inds, &self.sortorder, &flags, sb_bits, i - 1, i)
                != Ordering::Greater
        }))
    }

    /// Merge duplicate coordinates by summing their values
    ///
    /// Sorts by the current sort order first.
    pub fn deduplicate(&mut self) {
        if self.nnz() <= 1 {
            return;
        }
        self.sort();

        let nmodes = self.nmodes();
        let mut write = 0;
        for read in 1..self.nnz() {
            let same = (0..nmodes).all(|m| self.inds[m][write] == self.inds[m][read]);
            if same {
                let merged = self.values[write] + self.values[read];
                self.values.as_mut_slice()[write] = merged;
            } else {
                write += 1;
                if write != read {
                    for m in 0..nmodes {
                        let c = self.inds[m][read];
                        self.inds[m].as_mut_slice()[write] = c;
                    }
                    let v = self.values[read];
                    self.values.as_mut_slice()[write] = v;
                }
            }
        }
        for mode_inds in &mut self.inds {
            mode_inds.truncate(write + 1);
        }
        self.values.truncate(write + 1);
    }

    /// Compute density (nnz / total_elements)
    pub fn density(&self) -> f64 {
        let total: f64 = self.ndims.iter().map(|&d| d as f64).product();
        self.nnz() as f64 / total
    }

    /// Bytes used by coordinates and values
    pub fn storage_bytes(&self) -> usize {
        self.nnz() * (self.nmodes() * std::mem::size_of::<Index>() + std::mem::size_of::<T>())
    }

    /// All `(coordinates, value)` pairs sorted by coordinates
    ///
    /// Two tensors holding the same multiset of nonzeros return equal
    /// vectors regardless of their storage order.
    pub fn pairs_sorted(&self) -> Vec<(Coords, T)> {
        let mut pairs: Vec<(Coords, T)> = self.iter().collect();
        pairs.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        });
        pairs
    }

    /// Convert to a dense array
    ///
    /// Duplicate coordinates are summed.
    ///
    /// # Complexity
    ///
    /// Time: O(nnz)
    /// Space: O(∏ᵢ ndims\[i\])
    pub fn to_dense(&self) -> ArrayD<T> {
        let shape: Vec<usize> = self.ndims.iter().map(|&d| to_usize(d)).collect();
        let mut dense = ArrayD::zeros(shape);
        let mut idx = vec![0usize; self.nmodes()];
        for i in 0..self.nnz() {
            for (slot, mode_inds) in idx.iter_mut().zip(&self.inds) {
                *slot = to_usize(mode_inds[i]);
            }
            let cell = &mut dense[idx.as_slice()];
            *cell = *cell + self.values[i];
        }
        dense
    }

    pub(crate) fn apply_permutation(&mut self, perm: &[usize]) {
        for mode_inds in &mut self.inds {
            let permuted: IndexVector = perm.iter().map(|&p| mode_inds[p]).collect();
            *mode_inds = permuted;
        }
        let values: ValueVector<T> = perm.iter().map(|&p| self.values[p]).collect();
        self.values = values;
    }

    pub(crate) fn set_sortorder(&mut self, order: Vec<usize>) {
        self.sortorder = order;
    }
}

/// Compare nonzeros `a` and `b` lexicographically by `order`
pub(crate) fn lexicographic_cmp(inds: &[IndexVector], order: &[usize], a: usize, b: usize) -> Ordering {
    for &m in order {
        match inds[m][a].cmp(&inds[m][b]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Compare nonzeros `a` and `b` in HiCOO block order
pub(crate) fn block_order_cmp(
    inds: &[IndexVector],
    order: &[usize],
    compressed: &[bool],
    sb_bits: u32,
    a: usize,
    b: usize,
) -> Ordering {
    let blocked = order.iter().copied().filter(|&m| compressed[m]);
    for m in blocked.clone() {
        match (inds[m][a] >> sb_bits).cmp(&(inds[m][b] >> sb_bits)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    let plain = order.iter().copied().filter(|&m| !compressed[m]);
    for m in blocked.chain(plain) {
        match inds[m][a].cmp(&inds[m][b]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

pub(crate) fn validate_ndims(ndims: &[Index]) -> SparseResult<()> {
    if ndims.is_empty() {
        return Err(ValidationError::EmptyShape.into());
    }
    if ndims.contains(&0) {
        return Err(ValidationError::ZeroInShape.into());
    }
    Ok(())
}

pub(crate) fn validate_mode_order(order: &[usize], nmodes: usize) -> SparseResult<()> {
    if order.len() != nmodes {
        return Err(ValidationError::InvalidModeOrder {
            reason: format!("expected {} modes, got {}", nmodes, order.len()),
        }
        .into());
    }
    let mut seen = vec![false; nmodes];
    for &m in order {
        if m >= nmodes || seen[m] {
            return Err(ValidationError::InvalidModeOrder {
                reason: format!("{:?} is not a permutation of 0..{}", order, nmodes),
            }
            .into());
        }
        seen[m] = true;
    }
    Ok(())
}

pub(crate) fn check_flags(flags: &[bool], nmodes: usize) -> SparseResult<()> {
    if flags.len() != nmodes {
        return Err(crate::error::HiCooError::ModeFlagMismatch {
            expected: nmodes,
            got: flags.len(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseTensor<f64> {
        SparseTensor::from_coords(
            vec![3, 4, 5],
            &[vec![2, 0, 1], vec![0, 3, 4], vec![0, 1, 2], vec![1, 1, 1]],
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_coo_creation() {
        let coo = sample();
        assert_eq!(coo.nnz(), 4);
        assert_eq!(coo.nmodes(), 3);
        assert_eq!(coo.ndims(), &[3, 4, 5]);
        assert_eq!(coo.sortorder(), &[0, 1, 2]);
    }

    #[test]
    fn test_coo_invalid_shape() {
        assert!(matches!(
            SparseTensor::<f64>::new(vec![]),
            Err(SparseError::Validation(ValidationError::EmptyShape))
        ));
        assert!(matches!(
            SparseTensor::<f64>::new(vec![3, 0]),
            Err(SparseError::Validation(ValidationError::ZeroInShape))
        ));
    }

    #[test]
    fn test_coo_push_bounds() {
        let mut coo = SparseTensor::<f64>::new(vec![2, 2]).unwrap();
        assert!(coo.push(&[1, 1], 1.0).is_ok());
        assert!(matches!(
            coo.push(&[2, 0], 1.0),
            Err(SparseError::Index(IndexError::OutOfBounds { .. }))
        ));
        assert!(matches!(
            coo.push(&[0], 1.0),
            Err(SparseError::Index(IndexError::DimensionMismatch { .. }))
        ));
        assert_eq!(coo.nnz(), 1);
    }

    #[test]
    fn test_from_parts_validates() {
        let ok = SparseTensor::from_parts(vec![4, 4], vec![vec![0, 3], vec![1, 2]], vec![1.0, 2.0]);
        assert!(ok.is_ok());

        let out = SparseTensor::from_parts(vec![4, 4], vec![vec![0, 4], vec![1, 2]], vec![1.0, 2.0]);
        assert!(matches!(out, Err(SparseError::Index(_))));

        let short = SparseTensor::from_parts(vec![4, 4], vec![vec![0], vec![1, 2]], vec![1.0, 2.0]);
        assert!(matches!(short, Err(SparseError::Validation(_))));
    }

    #[test]
    fn test_sort_by_order() {
        let mut coo = sample();
        coo.sort_by_order(&[1, 0, 2]).unwrap();
        assert_eq!(coo.mode_indices(1).unwrap(), &[0, 1, 1, 3]);
        assert_eq!(coo.mode_indices(0).unwrap(), &[2, 0, 1, 0]);
        assert_eq!(coo.values(), &[1.0, 3.0, 4.0, 2.0]);
        assert_eq!(coo.sortorder(), &[1, 0, 2]);

        assert!(coo.sort_by_order(&[0, 0, 1]).is_err());
        assert!(coo.sort_by_order(&[0, 1]).is_err());
    }

    #[test]
    fn test_sort_keeps_stored_order() {
        let mut coo = sample();
        coo.sort_by_order(&[1, 0, 2]).unwrap();
        assert!(coo.sort_by_order(&[2, 2, 2]).is_err());
        assert_eq!(coo.sortorder(), &[1, 0, 2]);

        coo.push(&[0, 0, 0], 5.0).unwrap();
        coo.sort();
        assert_eq!(coo.sortorder(), &[1, 0, 2]);
        assert_eq!(coo.mode_indices(1).unwrap(), &[0, 0, 1, 1, 3]);
        assert_eq!(coo.mode_indices(0).unwrap(), &[0, 2, 0, 1, 0]);
        assert_eq!(coo.values(), &[5.0, 1.0, 3.0, 4.0, 2.0]);
    }

    #[test]
    fn test_sort_in_block_order_groups_blocks() {
        // Lexicographic order interleaves blocks: (0,5) (1,0) (1,6) with block size 4
        let mut coo = SparseTensor::from_coords(
            vec![8, 8],
            &[vec![1, 6], vec![0, 5], vec![1, 0]],
            &[3.0, 1.0, 2.0],
        )
        .unwrap();
        coo.sort_in_block_order(2).unwrap();
        assert_eq!(coo.mode_indices(0).unwrap(), &[1, 0, 1]);
        assert_eq!(coo.mode_indices(1).unwrap(), &[0, 5, 6]);
        assert!(coo.is_block_sorted(2).unwrap());

        coo.sort();
        assert!(!coo.is_block_sorted(2).unwrap());
    }

    #[test]
    fn test_entry_out_of_range() {
        let coo = sample();
        let (coords, value) = coo.entry(1).unwrap();
        assert_eq!(coords.as_slice(), &[0, 3, 4]);
        assert_eq!(value, 2.0);
        assert!(matches!(
            coo.entry(4),
            Err(SparseError::Core(CoreError::IndexOutOfRange { index: 4, len: 4 }))
        ));
    }

    #[test]
    fn test_coo_deduplicate() {
        let mut coo = SparseTensor::from_coords(
            vec![3, 3],
            &[vec![0, 0], vec![1, 1], vec![0, 0], vec![2, 2], vec![1, 1]],
            &[1.0, 3.0, 2.0, 5.0, 4.0],
        )
        .unwrap();
        coo.deduplicate();
        assert_eq!(coo.nnz(), 3);
        assert_eq!(coo.values(), &[3.0, 7.0, 5.0]);
    }

    #[test]
    fn test_pairs_sorted_ignores_storage_order() {
        let a = sample();
        let mut b = sample();
        b.sort_by_order(&[2, 1, 0]).unwrap();
        assert_eq!(a.pairs_sorted(), b.pairs_sorted());
    }

    #[test]
    fn test_to_dense() {
        let coo = sample();
        let dense = coo.to_dense();
        assert_eq!(dense.shape(), &[3, 4, 5]);
        assert_eq!(dense[[2, 0, 1]], 1.0);
        assert_eq!(dense[[1, 1, 1]], 4.0);
        assert_eq!(dense[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_density() {
        let coo = SparseTensor::from_coords(vec![10, 10], &[vec![0, 0], vec![1, 1]], &[1.0, 2.0])
            .unwrap();
        assert!((coo.density() - 0.02).abs() < 1e-12);
    }
}
