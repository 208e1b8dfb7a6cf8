//! Semi-sparse tensors: dense fibers along one or more modes
//!
//! A semi-sparse tensor stores the nonzeros of a COO tensor grouped into
//! fibers: every distinct coordinate tuple over the sparse modes becomes one
//! fiber, and the fiber holds a dense row spanning the dense mode(s).
//!
//! - [`SemiSparseTensor`]: a single dense mode; fibers are rows of a
//!   [`Matrix`] with `ndims[mode]` columns.
//! - [`SemiSparseTensorGeneral`]: a set of dense modes, each with its own
//!   padded stride; a fiber is a dense slab over all of them.
//!
//! In both layouts `nnz()` counts fibers, not scalar nonzeros.
//!
//! # Example
//!
//! ```
//! use sptensor_sparse::{SemiSparseTensor, SparseTensor};
//!
//! let coo = SparseTensor::from_coords(
//!     vec![4, 3],
//!     &[vec![0, 0], vec![0, 2], vec![3, 1]],
//!     &[1.0, 2.0, 3.0],
//! )
//! .unwrap();
//!
//! // Mode 1 dense: one fiber per distinct row
//! let semi = SemiSparseTensor::from_coo(&coo, 1).unwrap();
//! assert_eq!(semi.nnz(), 2);
//! assert_eq!(semi.fiber(0).unwrap(), &[1.0, 0.0, 2.0]);
//! ```

use scirs2_core::numeric::Float;
use sptensor_core::{to_usize, Index, IndexVector, Matrix, MatrixLayout, ValueVector};

use crate::coo::{block_order_cmp, SparseTensor};
use crate::error::{SparseError, SparseResult, ValidationError};
use crate::hicoo::check_sb_bits;

/// Semi-sparse tensor with one dense mode
#[derive(Debug, Clone)]
pub struct SemiSparseTensor<T> {
    ndims: Vec<Index>,
    /// The dense mode
    mode: usize,
    /// Sparse modes by priority, followed by the dense mode
    sortorder: Vec<usize>,
    /// Fiber coordinates, `inds[m][fiber]`; `inds[mode]` stays empty
    inds: Vec<IndexVector>,
    /// One row per fiber, `ndims[mode]` columns
    values: Matrix<T>,
}

impl<T: Float> SemiSparseTensor<T> {
    /// Groups the nonzeros of `coo` into fibers along `mode`.
    ///
    /// Duplicate coordinates are summed.
    pub fn from_coo(coo: &SparseTensor<T>, mode: usize) -> SparseResult<Self> {
        Self::with_layout(coo, mode, MatrixLayout::default())
    }

    /// Same as [`SemiSparseTensor::from_coo`] with an explicit row layout.
    pub fn with_layout(coo: &SparseTensor<T>, mode: usize, layout: MatrixLayout) -> SparseResult<Self> {
        let nmodes = coo.nmodes();
        if mode >= nmodes {
            return Err(SparseError::invalid_mode(mode, nmodes));
        }
        let smodes: Vec<usize> = coo.sortorder().iter().copied().filter(|&m| m != mode).collect();
        let mut order = smodes.clone();
        order.push(mode);

        let mut sorted = coo.clone();
        sorted.sort_by_order(&order)?;
        let inds = sorted.inds();

        let starts = fiber_starts(inds, &smodes, sorted.nnz());
        let mut fiber_inds: Vec<IndexVector> = (0..nmodes).map(|_| IndexVector::new()).collect();
        for &start in &starts {
            for &m in &smodes {
                fiber_inds[m].append(inds[m][start])?;
            }
        }

        let mut values = Matrix::with_layout(starts.len(), to_usize(coo.ndims()[mode]), layout)?;
        let mut fiber = 0;
        for i in 0..sorted.nnz() {
            if starts.get(fiber + 1) == Some(&i) {
                fiber += 1;
            }
            let col = to_usize(inds[mode][i]);
            let acc = values.get(fiber, col)?;
            values.set(fiber, col, acc + sorted.values()[i])?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nnz = coo.nnz(),
            nfibers = starts.len(),
            mode,
            "built semi-sparse tensor"
        );
        Ok(Self {
            ndims: coo.ndims().to_vec(),
            mode,
            sortorder: order,
            inds: fiber_inds,
            values,
        })
    }

    pub(crate) fn from_parts(
        ndims: Vec<Index>,
        mode: usize,
        sortorder: Vec<usize>,
        inds: Vec<IndexVector>,
        values: Matrix<T>,
    ) -> Self {
        Self {
            ndims,
            mode,
            sortorder,
            inds,
            values,
        }
    }

    /// Expands fibers back to COO, dropping zero entries.
    ///
    /// The result is sorted by the tensor's sort order.
    pub fn to_coo(&self) -> SparseResult<SparseTensor<T>> {
        let mut inds: Vec<Vec<Index>> = vec![Vec::new(); self.nmodes()];
        let mut values = Vec::new();
        for (fiber, row) in self.values.rows().enumerate() {
            for (col, &v) in row.iter().enumerate() {
                if v == T::zero() {
                    continue;
                }
                for (m, mode_inds) in inds.iter_mut().enumerate() {
                    mode_inds.push(if m == self.mode {
                        col as Index
                    } else {
                        self.inds[m][fiber]
                    });
                }
                values.push(v);
            }
        }
        let mut coo = SparseTensor::from_parts(self.ndims.clone(), inds, values)?;
        coo.set_sortorder(self.sortorder.clone());
        Ok(coo)
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

    pub fn sortorder(&self) -> &[usize] {
        &self.sortorder
    }

    /// Number of fibers
    pub fn nnz(&self) -> usize {
        self.values.nrows()
    }

    /// Fiber coordinates along sparse `mode`
    pub fn mode_indices(&self, mode: usize) -> SparseResult<&[Index]> {
        if mode == self.mode {
            return Err(ValidationError::InvalidDenseModes {
                reason: format!("mode {} is stored densely", mode),
            }
            .into());
        }
        self.inds
            .get(mode)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }

    pub(crate) fn inds(&self) -> &[IndexVector] {
        &self.inds
    }

    /// Fiber values, one matrix row per fiber
    pub fn values(&self) -> &Matrix<T> {
        &self.values
    }

    /// Dense row of fiber `i`
    pub fn fiber(&self, i: usize) -> SparseResult<&[T]> {
        Ok(self.values.row(i)?)
    }

    /// Sparse modes in sort priority
    pub fn sparse_modes(&self) -> impl Iterator<Item = usize> + '_ {
        self.sortorder.iter().copied().filter(move |&m| m != self.mode)
    }

    /// Reorders fibers so that fibers sharing a block over the sparse modes
    /// are contiguous.
    pub fn sort_in_block_order(&mut self, sb_bits: u32) -> SparseResult<()> {
        check_sb_bits(sb_bits)?;
        let smodes: Vec<usize> = self.sparse_modes().collect();
        let compressed = vec![true; self.nmodes()];
        let mut perm: Vec<usize> = (0..self.nnz()).collect();
        perm.sort_by(|&a, &b| block_order_cmp(&self.inds, &smodes, &compressed, sb_bits, a, b));

        for &m in &smodes {
            let permuted: IndexVector = perm.iter().map(|&p| self.inds[m][p]).collect();
            self.inds[m] = permuted;
        }
        let mut values = Matrix::with_layout(self.nnz(), self.values.ncols(), self.values.layout())?;
        for (dst, &src) in perm.iter().enumerate() {
            values.row_mut(dst)?.copy_from_slice(self.values.row(src)?);
        }
        self.values = values;

        #[cfg(feature = "tracing")]
        tracing::debug!(nfibers = self.nnz(), sb_bits, "sorted semi-sparse tensor in block order");
        Ok(())
    }
}

/// Semi-sparse tensor with several dense modes
///
/// Every fiber is a dense slab over `dense_modes()`, laid out row-major with
/// the per-mode padded strides in `strides()`.
#[derive(Debug, Clone)]
pub struct SemiSparseTensorGeneral<T> {
    ndims: Vec<Index>,
    /// Dense modes, ascending
    dmodes: Vec<usize>,
    /// Sparse modes by priority
    smodes: Vec<usize>,
    /// Padded extent of each dense mode, aligned with `dmodes`
    strides: Vec<usize>,
    inds: Vec<IndexVector>,
    /// `nfibers * slab_len()` values
    values: ValueVector<T>,
}

impl<T: Float> SemiSparseTensorGeneral<T> {
    /// Groups the nonzeros of `coo` into slabs over `dmodes`.
    pub fn from_coo(coo: &SparseTensor<T>, dmodes: &[usize]) -> SparseResult<Self> {
        Self::with_layout(coo, dmodes, MatrixLayout::default())
    }

    /// Same as [`SemiSparseTensorGeneral::from_coo`] with an explicit stride
    /// alignment.
    pub fn with_layout(
        coo: &SparseTensor<T>,
        dmodes: &[usize],
        layout: MatrixLayout,
    ) -> SparseResult<Self> {
        let nmodes = coo.nmodes();
        let dmodes = validate_dense_modes(dmodes, nmodes)?;
        let is_dense = |m: usize| dmodes.contains(&m);
        let smodes: Vec<usize> = coo.sortorder().iter().copied().filter(|&m| !is_dense(m)).collect();
        let strides: Vec<usize> = dmodes
            .iter()
            .map(|&m| layout.padded_stride(to_usize(coo.ndims()[m])))
            .collect();
        let slab: usize = strides.iter().product();

        let mut order = smodes.clone();
        order.extend(dmodes.iter().copied());
        let mut sorted = coo.clone();
        sorted.sort_by_order(&order)?;
        let inds = sorted.inds();

        let starts = fiber_starts(inds, &smodes, sorted.nnz());
        let mut fiber_inds: Vec<IndexVector> = (0..nmodes).map(|_| IndexVector::new()).collect();
        for &start in &starts {
            for &m in &smodes {
                fiber_inds[m].append(inds[m][start])?;
            }
        }

        let mut values = ValueVector::filled(starts.len() * slab, T::zero())?;
        let mut fiber = 0;
        for i in 0..sorted.nnz() {
            if starts.get(fiber + 1) == Some(&i) {
                fiber += 1;
            }
            let offset = dmodes
                .iter()
                .zip(&strides)
                .fold(0, |acc, (&m, &s)| acc * s + to_usize(inds[m][i]));
            let slot = &mut values.as_mut_slice()[fiber * slab + offset];
            *slot = *slot + sorted.values()[i];
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nnz = coo.nnz(),
            nfibers = starts.len(),
            ?dmodes,
            "built general semi-sparse tensor"
        );
        Ok(Self {
            ndims: coo.ndims().to_vec(),
            dmodes,
            smodes,
            strides,
            inds: fiber_inds,
            values,
        })
    }

    /// Expands slabs back to COO, dropping zeros and padding.
    pub fn to_coo(&self) -> SparseResult<SparseTensor<T>> {
        let nmodes = self.nmodes();
        let mut inds: Vec<Vec<Index>> = vec![Vec::new(); nmodes];
        let mut values = Vec::new();
        let extents: Vec<Index> = self.dmodes.iter().map(|&m| self.ndims[m]).collect();
        let slab = self.slab_len();

        for fiber in 0..self.nnz() {
            let mut dense = vec![0 as Index; self.dmodes.len()];
            loop {
                let offset = dense
                    .iter()
                    .zip(&self.strides)
                    .fold(0, |acc, (&c, &s)| acc * s + to_usize(c));
                let v = self.values[fiber * slab + offset];
                if v != T::zero() {
                    for &m in &self.smodes {
                        inds[m].push(self.inds[m][fiber]);
                    }
                    for (&m, &c) in self.dmodes.iter().zip(&dense) {
                        inds[m].push(c);
                    }
                    values.push(v);
                }
                if !advance(&mut dense, &extents) {
                    break;
                }
            }
        }

        let mut coo = SparseTensor::from_parts(self.ndims.clone(), inds, values)?;
        let order: Vec<usize> = self.smodes.iter().chain(&self.dmodes).copied().collect();
        coo.set_sortorder(order);
        Ok(coo)
    }

    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    /// Dense modes, ascending
    pub fn dense_modes(&self) -> &[usize] {
        &self.dmodes
    }

    /// Padded extent of every dense mode
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Values per fiber, padding included
    pub fn slab_len(&self) -> usize {
        self.strides.iter().product()
    }

    /// Number of fibers
    pub fn nnz(&self) -> usize {
        self.values.len().checked_div(self.slab_len()).unwrap_or(0)
    }

    /// Slab of fiber `i`
    pub fn fiber(&self, i: usize) -> SparseResult<&[T]> {
        if i >= self.nnz() {
            return Err(sptensor_core::CoreError::out_of_range(i, self.nnz()).into());
        }
        let slab = self.slab_len();
        Ok(&self.values[i * slab..(i + 1) * slab])
    }

    /// Fiber coordinates along sparse `mode`
    pub fn mode_indices(&self, mode: usize) -> SparseResult<&[Index]> {
        if self.dmodes.contains(&mode) {
            return Err(ValidationError::InvalidDenseModes {
                reason: format!("mode {} is stored densely", mode),
            }
            .into());
        }
        self.inds
            .get(mode)
            .map(|v| v.as_slice())
            .ok_or_else(|| SparseError::invalid_mode(mode, self.nmodes()))
    }
}

/// Positions where a new fiber starts in a tensor sorted by `smodes` first
fn fiber_starts(inds: &[IndexVector], smodes: &[usize], nnz: usize) -> Vec<usize> {
    (0..nnz)
        .filter(|&i| {
            i == 0
                || smodes.iter().any(|&m| inds[m][i - 1] != inds[m][i])
        })
        .collect()
}

/// Odometer step over `extents`, last position fastest
fn advance(coords: &mut [Index], extents: &[Index]) -> bool {
    for (c, &e) in coords.iter_mut().zip(extents).rev() {
        *c += 1;
        if *c < e {
            return true;
        }
        *c = 0;
    }
    false
}

fn validate_dense_modes(dmodes: &[usize], nmodes: usize) -> SparseResult<Vec<usize>> {
    if dmodes.is_empty() {
        return Err(ValidationError::InvalidDenseModes {
            reason: "at least one dense mode is required".into(),
        }
        .into());
    }
    let mut sorted = dmodes.to_vec();
    sorted.sort_unstable();
    if let Some(&m) = sorted.iter().find(|&&m| m >= nmodes) {
        return Err(SparseError::invalid_mode(m, nmodes));
    }
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(ValidationError::InvalidDenseModes {
            reason: format!("{:?} repeats a mode", dmodes),
        }
        .into());
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseTensor<f64> {
        SparseTensor::from_coords(
            vec![4, 5, 3],
            &[
                vec![3, 4, 2],
                vec![0, 1, 0],
                vec![0, 1, 2],
                vec![2, 0, 1],
                vec![0, 1, 2],
            ],
            &[1.0, 2.0, 3.0, 4.0, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn test_fibers_along_last_mode() {
        let semi = SemiSparseTensor::from_coo(&sample(), 2).unwrap();
        assert_eq!(semi.nnz(), 3);
        assert_eq!(semi.mode(), 2);
        assert_eq!(semi.sortorder(), &[0, 1, 2]);
        assert_eq!(semi.mode_indices(0).unwrap(), &[0, 2, 3]);
        assert_eq!(semi.mode_indices(1).unwrap(), &[1, 0, 4]);
        // Duplicate (0,1,2) summed
        assert_eq!(semi.fiber(0).unwrap(), &[2.0, 0.0, 3.5]);
        assert_eq!(semi.values().stride(), 8);
        assert!(semi.mode_indices(2).is_err());
    }

    #[test]
    fn test_semi_sparse_roundtrip() {
        let mut coo = sample();
        coo.deduplicate();
        for mode in 0..3 {
            let semi = SemiSparseTensor::from_coo(&coo, mode).unwrap();
            let back = semi.to_coo().unwrap();
            assert_eq!(back.pairs_sorted(), coo.pairs_sorted());
        }
    }

    #[test]
    fn test_semi_sparse_invalid_mode() {
        assert!(matches!(
            SemiSparseTensor::from_coo(&sample(), 3),
            Err(SparseError::Validation(ValidationError::InvalidMode { mode: 3, nmodes: 3 }))
        ));
    }

    #[test]
    fn test_semi_sparse_block_order() {
        let coo = SparseTensor::from_coords(
            vec![8, 8, 2],
            &[vec![0, 5, 0], vec![1, 0, 1], vec![1, 6, 0]],
            &[1.0, 2.0, 3.0],
        )
        .unwrap();
        let mut semi = SemiSparseTensor::from_coo(&coo, 2).unwrap();
        assert_eq!(semi.mode_indices(1).unwrap(), &[5, 0, 6]);

        semi.sort_in_block_order(2).unwrap();
        assert_eq!(semi.mode_indices(0).unwrap(), &[1, 0, 1]);
        assert_eq!(semi.mode_indices(1).unwrap(), &[0, 5, 6]);
        assert_eq!(semi.fiber(0).unwrap(), &[0.0, 2.0]);
        assert_eq!(semi.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());

        assert!(semi.sort_in_block_order(9).is_err());
    }

    #[test]
    fn test_general_semi_sparse_two_dense_modes() {
        let mut coo = sample();
        coo.deduplicate();
        let semi = SemiSparseTensorGeneral::from_coo(&coo, &[2, 1]).unwrap();

        assert_eq!(semi.dense_modes(), &[1, 2]);
        assert_eq!(semi.strides(), &[8, 8]);
        assert_eq!(semi.slab_len(), 64);
        assert_eq!(semi.nnz(), 3);
        assert_eq!(semi.mode_indices(0).unwrap(), &[0, 2, 3]);
        assert_eq!(semi.fiber(0).unwrap()[8 + 2], 3.5);
        assert!(semi.fiber(3).is_err());

        assert_eq!(semi.to_coo().unwrap().pairs_sorted(), coo.pairs_sorted());
    }

    #[test]
    fn test_general_semi_sparse_rejects_bad_modes() {
        let coo = sample();
        assert!(SemiSparseTensorGeneral::from_coo(&coo, &[]).is_err());
        assert!(SemiSparseTensorGeneral::from_coo(&coo, &[1, 1]).is_err());
        assert!(SemiSparseTensorGeneral::from_coo(&coo, &[5]).is_err());
    }

    #[test]
    fn test_advance_odometer() {
        let mut c = vec![0, 0];
        let mut seen = 1;
        while advance(&mut c, &[2, 3]) {
            seen += 1;
        }
        assert_eq!(seen, 6);
        assert_eq!(c, vec![0, 0]);
    }
}
