//! Sparse matrices in coordinate and compressed-row form
//!
//! [`SparseMatrix`] is the two-mode counterpart of [`SparseTensor`]: three
//! index-aligned arrays of rows, columns and values. [`SparseMatrixCsr`]
//! compresses the row array into row pointers.
//!
//! # CSR Format
//!
//! For an `nrows × ncols` matrix with `nnz` nonzeros:
//! - `rowptr`: length `nrows + 1`, row `r` owns `rowptr[r]..rowptr[r + 1]`
//! - `colind`: column of every nonzero, ascending within a row
//! - `values`: nonzero values
//!
//! # Example
//!
//! ```
//! use sptensor_sparse::{SparseMatrix, SparseMatrixCsr};
//!
//! let mut coo = SparseMatrix::<f64>::new(2, 3);
//! coo.push(1, 2, 3.0).unwrap();
//! coo.push(0, 0, 1.0).unwrap();
//! coo.push(0, 2, 2.0).unwrap();
//!
//! let csr = SparseMatrixCsr::from_coo(&coo).unwrap();
//! assert_eq!(csr.rowptr(), &[0, 2, 3]);
//! assert_eq!(csr.spmv(&[1.0, 1.0, 1.0]).unwrap(), vec![3.0, 3.0]);
//! ```

use scirs2_core::numeric::Float;
use sptensor_core::{to_usize, Index, IndexVector, NnzIndex, NnzIndexVector, ValueVector};

use crate::coo::SparseTensor;
use crate::error::{IndexError, SparseError, SparseResult, ValidationError};

/// Sparse matrix in coordinate form
#[derive(Debug, Clone)]
pub struct SparseMatrix<T> {
    nrows: Index,
    ncols: Index,
    rowind: IndexVector,
    colind: IndexVector,
    values: ValueVector<T>,
}

impl<T: Float> SparseMatrix<T> {
    /// Empty `nrows × ncols` matrix
    pub fn new(nrows: Index, ncols: Index) -> Self {
        Self {
            nrows,
            ncols,
            rowind: IndexVector::new(),
            colind: IndexVector::new(),
            values: ValueVector::new(),
        }
    }

    /// Takes the nonzeros of a two-mode tensor.
    pub fn from_tensor(coo: &SparseTensor<T>) -> SparseResult<Self> {
        if coo.nmodes() != 2 {
            return Err(IndexError::DimensionMismatch {
                expected: 2,
                got: coo.nmodes(),
            }
            .into());
        }
        Ok(Self {
            nrows: coo.ndims()[0],
            ncols: coo.ndims()[1],
            rowind: coo.inds()[0].clone(),
            colind: coo.inds()[1].clone(),
            values: ValueVector::from_vec(coo.values().to_vec()),
        })
    }

    /// Appends a nonzero; coordinates are bounds-checked.
    pub fn push(&mut self, row: Index, col: Index, value: T) -> SparseResult<()> {
        if row >= self.nrows || col >= self.ncols {
            return Err(SparseError::index_out_of_bounds(
                vec![row, col],
                vec![self.nrows, self.ncols],
            ));
        }
        self.rowind.append(row)?;
        self.colind.append(col)?;
        self.values.append(value)?;
        Ok(())
    }

    pub fn nrows(&self) -> Index {
        self.nrows
    }

    pub fn ncols(&self) -> Index {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn rowind(&self) -> &[Index] {
        &self.rowind
    }

    pub fn colind(&self) -> &[Index] {
        &self.colind
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Stable sort by row, then column.
    pub fn sort(&mut self) {
        let mut perm: Vec<usize> = (0..self.nnz()).collect();
        perm.sort_by_key(|&i| (self.rowind[i], self.colind[i]));
        self.rowind = perm.iter().map(|&p| self.rowind[p]).collect();
        self.colind = perm.iter().map(|&p| self.colind[p]).collect();
        self.values = perm.iter().map(|&p| self.values[p]).collect();
    }
}

/// Sparse matrix in compressed-row form
#[derive(Debug, Clone)]
pub struct SparseMatrixCsr<T> {
    nrows: Index,
    ncols: Index,
    rowptr: NnzIndexVector,
    colind: IndexVector,
    values: ValueVector<T>,
}

impl<T: Float> SparseMatrixCsr<T> {
    /// Compresses a coordinate matrix.
    ///
    /// Nonzeros are ordered by row, then column; duplicates are kept.
    ///
    /// # Complexity
    ///
    /// O(nnz × log(nnz)) for sorting + O(nnz + nrows)
    pub fn from_coo(coo: &SparseMatrix<T>) -> SparseResult<Self> {
        let mut sorted = coo.clone();
        sorted.sort();

        let nrows = to_usize(coo.nrows);
        let mut counts = vec![0usize; nrows + 1];
        for &r in sorted.rowind() {
            counts[to_usize(r) + 1] += 1;
        }
        for r in 0..nrows {
            counts[r + 1] += counts[r];
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(nrows, nnz = sorted.nnz(), "compressed sparse matrix rows");
        Ok(Self {
            nrows: coo.nrows,
            ncols: coo.ncols,
            rowptr: NnzIndexVector::from_vec(counts),
            colind: sorted.colind,
            values: sorted.values,
        })
    }

    /// Expands row pointers back to coordinates.
    pub fn to_coo(&self) -> SparseResult<SparseMatrix<T>> {
        let mut coo = SparseMatrix::new(self.nrows, self.ncols);
        for r in 0..to_usize(self.nrows) {
            let (cols, vals) = self.row(r)?;
            for (&c, &v) in cols.iter().zip(vals) {
                coo.push(r as Index, c, v)?;
            }
        }
        Ok(coo)
    }

    pub fn nrows(&self) -> Index {
        self.nrows
    }

    pub fn ncols(&self) -> Index {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn rowptr(&self) -> &[NnzIndex] {
        &self.rowptr
    }

    pub fn colind(&self) -> &[Index] {
        &self.colind
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Columns and values of row `r`
    pub fn row(&self, r: usize) -> SparseResult<(&[Index], &[T])> {
        if r >= to_usize(self.nrows) {
            return Err(sptensor_core::CoreError::out_of_range(r, to_usize(self.nrows)).into());
        }
        let range = self.rowptr[r]..self.rowptr[r + 1];
        Ok((&self.colind[range.clone()], &self.values[range]))
    }

    /// Sparse matrix-vector product `y = A x`.
    pub fn spmv(&self, x: &[T]) -> SparseResult<Vec<T>> {
        if x.len() != to_usize(self.ncols) {
            return Err(ValidationError::ShapeDimsMismatch {
                expected: to_usize(self.ncols),
                got: x.len(),
            }
            .into());
        }
        let y = self
            .rowptr
            .windows(2)
            .map(|w| {
                (w[0]..w[1]).fold(T::zero(), |acc, i| {
                    acc + self.values[i] * x[to_usize(self.colind[i])]
                })
            })
            .collect();
        Ok(y)
    }
}
