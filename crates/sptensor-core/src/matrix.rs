//! Row-major dense matrices with padded rows
//!
//! Factor matrices of CP decompositions and the dense fibers of semi-sparse
//! tensors are stored as [`Matrix`]: a row-major array whose row stride is
//! `ncols` rounded up to a multiple of an alignment unit. Padding keeps every
//! row start aligned for vectorized inner loops without changing the logical
//! `nrows × ncols` shape.
//!
//! [`RankMatrix`] is the bounded variant used for small CP ranks: its column
//! count and stride never exceed [`MAX_RANK`], so they are stored as
//! [`RankIndex`].
//!
//! # Examples
//!
//! ```
//! use sptensor_core::{Matrix, MatrixLayout};
//!
//! let mut m = Matrix::<f64>::new(3, 5).unwrap();
//! assert_eq!(m.stride(), 8);
//! m.set(2, 4, 1.5).unwrap();
//! assert_eq!(m.get(2, 4).unwrap(), 1.5);
//! assert_eq!(m.as_slice()[2 * 8 + 4], 1.5);
//!
//! let wide = Matrix::<f32>::with_layout(2, 5, MatrixLayout::new(16).unwrap()).unwrap();
//! assert_eq!(wide.stride(), 16);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use scirs2_core::numeric::Float;

use crate::error::{CoreError, CoreResult};

/// Default alignment unit for row strides, in elements.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Largest column count (and stride) of a [`RankMatrix`].
pub const MAX_RANK: usize = 256;

/// Column index type of [`RankMatrix`]; wide enough for [`MAX_RANK`].
pub type RankIndex = u16;

/// Row layout parameters of a dense matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatrixLayout {
    /// Row strides are rounded up to a multiple of this many elements
    pub alignment: usize,
}

impl Default for MatrixLayout {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl MatrixLayout {
    /// Creates a layout with the given alignment unit.
    pub fn new(alignment: usize) -> CoreResult<Self> {
        if alignment == 0 {
            return Err(CoreError::InvalidShape(
                "alignment unit must be positive".to_string(),
            ));
        }
        Ok(Self { alignment })
    }

    /// Smallest multiple of the alignment unit that is `>= ncols`.
    #[inline]
    pub fn padded_stride(&self, ncols: usize) -> usize {
        ncols.div_ceil(self.alignment) * self.alignment
    }
}

/// Dense row-major matrix with padded row stride.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix<T> {
    nrows: usize,
    ncols: usize,
    /// Allocated rows
    cap: usize,
    stride: usize,
    layout: MatrixLayout,
    /// Length `cap * stride`
    values: Vec<T>,
}

impl<T: Float> Matrix<T> {
    /// Creates a zero matrix with the default layout.
    pub fn new(nrows: usize, ncols: usize) -> CoreResult<Self> {
        Self::with_layout(nrows, ncols, MatrixLayout::default())
    }

    /// Creates a zero matrix with an explicit layout.
    pub fn with_layout(nrows: usize, ncols: usize, layout: MatrixLayout) -> CoreResult<Self> {
        let layout = MatrixLayout::new(layout.alignment)?;
        let stride = layout.padded_stride(ncols);
        let values = zeroed(nrows, stride)?;
        Ok(Self {
            nrows,
            ncols,
            cap: nrows,
            stride,
            layout,
            values,
        })
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows(rows: &[Vec<T>]) -> CoreResult<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::new(rows.len(), ncols)?;
        for (r, row) in rows.iter().enumerate() {
            if row.len() != ncols {
                return Err(CoreError::InvalidShape(format!(
                    "row {} has {} columns, expected {}",
                    r,
                    row.len(),
                    ncols
                )));
            }
            matrix.row_mut(r)?.copy_from_slice(row);
        }
        Ok(matrix)
    }

    /// Number of logical rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of logical columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Distance in elements between the starts of consecutive rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of rows the storage can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Layout the matrix was created with.
    #[inline]
    pub fn layout(&self) -> MatrixLayout {
        self.layout
    }

    /// Raw storage including padding, length `capacity() * stride()`.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Mutable raw storage including padding.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Bounds-checked element read.
    pub fn get(&self, row: usize, col: usize) -> CoreResult<T> {
        let offset = self.offset(row, col)?;
        Ok(self.values[offset])
    }

    /// Bounds-checked element write.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> CoreResult<()> {
        let offset = self.offset(row, col)?;
        self.values[offset] = value;
        Ok(())
    }

    /// The `ncols` logical entries of a row.
    pub fn row(&self, row: usize) -> CoreResult<&[T]> {
        if row >= self.nrows {
            return Err(CoreError::out_of_range(row, self.nrows));
        }
        let start = row * self.stride;
        Ok(&self.values[start..start + self.ncols])
    }

    /// Mutable view of the `ncols` logical entries of a row.
    pub fn row_mut(&mut self, row: usize) -> CoreResult<&mut [T]> {
        if row >= self.nrows {
            return Err(CoreError::out_of_range(row, self.nrows));
        }
        let start = row * self.stride;
        Ok(&mut self.values[start..start + self.ncols])
    }

    /// Iterates over logical rows.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.values
            .chunks(self.stride.max(1))
            .take(if self.stride == 0 { 0 } else { self.nrows })
            .map(move |chunk| &chunk[..self.ncols])
    }

    /// Changes the number of rows, keeping the content of surviving rows.
    ///
    /// Storage is reallocated only when `new_nrows` exceeds the capacity;
    /// rows that become visible are zero.
    pub fn resize_rows(&mut self, new_nrows: usize) -> CoreResult<()> {
        if new_nrows > self.cap {
            let new_cap = new_nrows.max(self.cap * 2);
            let additional = (new_cap - self.cap) * self.stride;
            self.values
                .try_reserve_exact(additional)
                .map_err(|_| CoreError::AllocationFailure {
                    requested: new_cap * self.stride,
                })?;
            self.values.resize(new_cap * self.stride, T::zero());
            self.cap = new_cap;
        }
        if new_nrows > self.nrows {
            let start = self.nrows * self.stride;
            let end = new_nrows * self.stride;
            self.values[start..end].fill(T::zero());
        }
        self.nrows = new_nrows;
        Ok(())
    }

    /// Sets every logical entry to `value`; padding stays zero.
    pub fn fill(&mut self, value: T) {
        let ncols = self.ncols;
        if self.stride == 0 {
            return;
        }
        for chunk in self.values.chunks_mut(self.stride).take(self.nrows) {
            chunk[..ncols].fill(value);
        }
    }

    /// Euclidean norm of every column.
    pub fn column_norms(&self) -> Vec<T> {
        let mut norms = vec![T::zero(); self.ncols];
        for row in self.rows() {
            for (norm, &v) in norms.iter_mut().zip(row) {
                *norm = *norm + v * v;
            }
        }
        norms.iter().map(|n| n.sqrt()).collect()
    }

    /// Scales every column to unit norm and returns the original norms.
    ///
    /// Columns with zero norm are left unchanged.
    pub fn normalize_columns(&mut self) -> Vec<T> {
        let norms = self.column_norms();
        let ncols = self.ncols;
        if self.stride == 0 {
            return norms;
        }
        for chunk in self.values.chunks_mut(self.stride).take(self.nrows) {
            for (v, &norm) in chunk[..ncols].iter_mut().zip(&norms) {
                if norm > T::zero() {
                    *v = *v / norm;
                }
            }
        }
        norms
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> CoreResult<usize> {
        if row >= self.nrows {
            return Err(CoreError::out_of_range(row, self.nrows));
        }
        if col >= self.ncols {
            return Err(CoreError::out_of_range(col, self.ncols));
        }
        Ok(row * self.stride + col)
    }
}

/// Dense matrix whose column count is bounded by [`MAX_RANK`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankMatrix<T> {
    inner: Matrix<T>,
    ncols: RankIndex,
    stride: RankIndex,
}

impl<T: Float> RankMatrix<T> {
    /// Creates a zero matrix; fails with `RankTooLarge` if `ncols > 256`.
    pub fn new(nrows: usize, ncols: usize) -> CoreResult<Self> {
        Self::with_layout(nrows, ncols, MatrixLayout::default())
    }

    /// Creates a zero matrix with an explicit layout.
    ///
    /// The padded stride must also stay within [`MAX_RANK`].
    pub fn with_layout(nrows: usize, ncols: usize, layout: MatrixLayout) -> CoreResult<Self> {
        if ncols > MAX_RANK {
            return Err(CoreError::RankTooLarge {
                rank: ncols,
                max: MAX_RANK,
            });
        }
        let layout = MatrixLayout::new(layout.alignment)?;
        let stride = layout.padded_stride(ncols);
        if stride > MAX_RANK {
            return Err(CoreError::RankTooLarge {
                rank: stride,
                max: MAX_RANK,
            });
        }
        let inner = Matrix::with_layout(nrows, ncols, layout)?;
        Ok(Self {
            inner,
            ncols: ncols as RankIndex,
            stride: stride as RankIndex,
        })
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> RankIndex {
        self.ncols
    }

    #[inline]
    pub fn stride(&self) -> RankIndex {
        self.stride
    }

    pub fn get(&self, row: usize, col: usize) -> CoreResult<T> {
        self.inner.get(row, col)
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> CoreResult<()> {
        self.inner.set(row, col, value)
    }

    pub fn row(&self, row: usize) -> CoreResult<&[T]> {
        self.inner.row(row)
    }

    pub fn row_mut(&mut self, row: usize) -> CoreResult<&mut [T]> {
        self.inner.row_mut(row)
    }

    pub fn resize_rows(&mut self, new_nrows: usize) -> CoreResult<()> {
        self.inner.resize_rows(new_nrows)
    }

    /// Unbounded view of the same storage.
    pub fn as_matrix(&self) -> &Matrix<T> {
        &self.inner
    }

    /// Mutable unbounded view; the column count cannot change through it.
    pub fn as_matrix_mut(&mut self) -> &mut Matrix<T> {
        &mut self.inner
    }
}

fn zeroed<T: Float>(nrows: usize, stride: usize) -> CoreResult<Vec<T>> {
    let len = nrows
        .checked_mul(stride)
        .ok_or(CoreError::AllocationFailure {
            requested: usize::MAX,
        })?;
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| CoreError::AllocationFailure { requested: len })?;
    values.resize(len, T::zero());
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_rounds_up_to_alignment() {
        for ncols in [1, 7, 8, 9, 16, 17, 100] {
            let m = Matrix::<f64>::new(2, ncols).unwrap();
            assert!(m.stride() >= ncols);
            assert_eq!(m.stride() % DEFAULT_ALIGNMENT, 0);
            assert!(m.stride() - ncols < DEFAULT_ALIGNMENT);
            assert_eq!(m.as_slice().len(), m.capacity() * m.stride());
        }
    }

    #[test]
    fn test_zero_alignment_rejected() {
        assert!(MatrixLayout::new(0).is_err());
        let bad = MatrixLayout { alignment: 0 };
        assert!(Matrix::<f64>::with_layout(2, 2, bad).is_err());
    }

    #[test]
    fn test_get_set_bounds() {
        let mut m = Matrix::<f32>::new(2, 3).unwrap();
        m.set(1, 2, 4.0).unwrap();
        assert_eq!(m.get(1, 2).unwrap(), 4.0);
        assert_eq!(
            m.get(2, 0).unwrap_err(),
            CoreError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert!(m.set(0, 3, 1.0).is_err());
        assert!(m.row(5).is_err());
    }

    #[test]
    fn test_resize_rows_preserves_content() {
        let mut m = Matrix::<f64>::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        m.resize_rows(5).unwrap();
        assert_eq!(m.nrows(), 5);
        assert!(m.capacity() >= 5);
        assert_eq!(m.row(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(m.row(1).unwrap(), &[3.0, 4.0]);
        assert_eq!(m.row(4).unwrap(), &[0.0, 0.0]);

        m.resize_rows(1).unwrap();
        assert_eq!(m.nrows(), 1);
        m.resize_rows(2).unwrap();
        assert_eq!(m.row(1).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = Matrix::<f64>::from_rows(&[vec![1.0], vec![1.0, 2.0]]);
        assert!(matches!(result, Err(CoreError::InvalidShape(_))));
    }

    #[test]
    fn test_normalize_columns() {
        let mut m = Matrix::<f64>::from_rows(&[vec![3.0, 0.0], vec![4.0, 0.0]]).unwrap();
        let norms = m.normalize_columns();
        assert!((norms[0] - 5.0).abs() < 1e-12);
        assert_eq!(norms[1], 0.0);
        assert!((m.get(0, 0).unwrap() - 0.6).abs() < 1e-12);
        assert!((m.get(1, 0).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_fill_leaves_padding_zero() {
        let mut m = Matrix::<f64>::new(2, 3).unwrap();
        m.fill(1.0);
        assert_eq!(m.row(1).unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(m.as_slice()[3], 0.0);
    }

    #[test]
    fn test_rank_matrix_bounds() {
        let m = RankMatrix::<f64>::new(10, 256).unwrap();
        assert_eq!(m.ncols(), 256);
        assert_eq!(m.stride(), 256);

        let err = RankMatrix::<f64>::new(10, 257).unwrap_err();
        assert_eq!(err, CoreError::RankTooLarge { rank: 257, max: 256 });

        let layout = MatrixLayout::new(48).unwrap();
        assert!(RankMatrix::<f64>::with_layout(1, 250, layout).is_err());
    }
}
