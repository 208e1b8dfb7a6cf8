//! Kruskal tensors: the result of a CP decomposition
//!
//! A Kruskal tensor represents X as a weighted sum of R rank-1 tensors:
//!
//! X ≈ Σᵣ λᵣ (u₁ᵣ ⊗ u₂ᵣ ⊗ ... ⊗ uₙᵣ)
//!
//! Where:
//! - R is the rank
//! - λᵣ are the component weights (`lambda`)
//! - uₘᵣ is column r of factor matrix Uₘ ∈ ℝ^(Iₘ×R)
//!
//! The containers here only own the storage: a decomposition driver fills
//! the factors, writes `lambda`, and records the `fit` it reached. Parallel
//! drivers scatter into factor rows concurrently and coordinate through
//! `sptensor-exec`'s mutex pool, keyed by row.
//!
//! [`RankKruskalTensor`] stores factors as [`RankMatrix`], which bounds the
//! rank by [`MAX_RANK`].

use scirs2_core::numeric::Float;
use sptensor_core::{to_usize, CoreError, Index, Matrix, RankIndex, RankMatrix, MAX_RANK};

use crate::error::{KruskalError, KruskalResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kruskal tensor with unbounded rank
///
/// # Examples
///
/// ```
/// use sptensor_decomp::KruskalTensor;
///
/// let mut kt = KruskalTensor::<f64>::new(3, 4, &[10, 20, 30]).unwrap();
/// assert_eq!(kt.factor(1).unwrap().nrows(), 20);
/// assert_eq!(kt.fit(), 0.0);
///
/// kt.set_fit(0.93);
/// assert_eq!(kt.fit(), 0.93);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KruskalTensor<T> {
    ndims: Vec<Index>,
    rank: usize,
    /// Component weights, length `rank`
    lambda: Vec<T>,
    /// Decomposition quality reported by the driver
    fit: f64,
    /// `factors[m]` is `ndims[m] × rank`
    factors: Vec<Matrix<T>>,
}

impl<T: Float> KruskalTensor<T> {
    /// Allocates zero factors, unit weights and `fit = 0`.
    ///
    /// # Errors
    ///
    /// - `ModeCountMismatch` if `ndims` does not have `nmodes` entries
    /// - `InvalidRank` if `rank == 0`
    pub fn new(nmodes: usize, rank: usize, ndims: &[Index]) -> KruskalResult<Self> {
        check_shape(nmodes, rank, ndims)?;
        let factors = ndims
            .iter()
            .map(|&d| Matrix::new(to_usize(d), rank))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            ndims: ndims.to_vec(),
            rank,
            lambda: vec![T::one(); rank],
            fit: 0.0,
            factors,
        })
    }

    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    pub fn lambda(&self) -> &[T] {
        &self.lambda
    }

    pub fn lambda_mut(&mut self) -> &mut [T] {
        &mut self.lambda
    }

    pub fn fit(&self) -> f64 {
        self.fit
    }

    /// Records the decomposition quality; any finite value is accepted.
    pub fn set_fit(&mut self, fit: f64) {
        self.fit = fit;
    }

    pub fn factors(&self) -> &[Matrix<T>] {
        &self.factors
    }

    /// Factor matrix of `mode`
    pub fn factor(&self, mode: usize) -> KruskalResult<&Matrix<T>> {
        let nmodes = self.nmodes();
        self.factors
            .get(mode)
            .ok_or_else(|| CoreError::out_of_range(mode, nmodes).into())
    }

    /// Mutable factor matrix of `mode`
    pub fn factor_mut(&mut self, mode: usize) -> KruskalResult<&mut Matrix<T>> {
        let nmodes = self.nmodes();
        self.factors
            .get_mut(mode)
            .ok_or_else(|| CoreError::out_of_range(mode, nmodes).into())
    }

    /// Scales every factor column to unit norm and folds the norms into
    /// `lambda`; the represented tensor does not change.
    pub fn normalize(&mut self) {
        for factor in &mut self.factors {
            let norms = factor.normalize_columns();
            for (l, n) in self.lambda.iter_mut().zip(norms) {
                if n > T::zero() {
                    *l = *l * n;
                }
            }
        }
    }

    /// Value of the model at one coordinate: Σᵣ λᵣ Πₘ Uₘ[coords[m], r]
    pub fn entry(&self, coords: &[Index]) -> KruskalResult<T> {
        let rows = factor_rows(self.nmodes(), coords, |m, c| self.factors[m].row(c))?;
        Ok(evaluate(&self.lambda, &rows))
    }
}

/// Kruskal tensor whose rank is bounded by [`MAX_RANK`]
///
/// # Examples
///
/// ```
/// use sptensor_decomp::{KruskalError, RankKruskalTensor};
///
/// let kt = RankKruskalTensor::<f32>::new(3, 16, &[100, 100, 100]).unwrap();
/// assert_eq!(kt.rank(), 16);
///
/// let err = RankKruskalTensor::<f32>::new(3, 300, &[100, 100, 100]).unwrap_err();
/// assert!(matches!(err, KruskalError::RankTooLarge { rank: 300, max: 256 }));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankKruskalTensor<T> {
    ndims: Vec<Index>,
    rank: RankIndex,
    lambda: Vec<T>,
    fit: f64,
    factors: Vec<RankMatrix<T>>,
}

impl<T: Float> RankKruskalTensor<T> {
    /// Same as [`KruskalTensor::new`], additionally requiring `rank <= 256`.
    pub fn new(nmodes: usize, rank: usize, ndims: &[Index]) -> KruskalResult<Self> {
        if rank > MAX_RANK {
            return Err(KruskalError::RankTooLarge {
                rank,
                max: MAX_RANK,
            });
        }
        check_shape(nmodes, rank, ndims)?;
        let factors = ndims
            .iter()
            .map(|&d| RankMatrix::new(to_usize(d), rank))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            ndims: ndims.to_vec(),
            rank: rank as RankIndex,
            lambda: vec![T::one(); rank],
            fit: 0.0,
            factors,
        })
    }

    pub fn nmodes(&self) -> usize {
        self.ndims.len()
    }

    pub fn rank(&self) -> RankIndex {
        self.rank
    }

    pub fn ndims(&self) -> &[Index] {
        &self.ndims
    }

    pub fn lambda(&self) -> &[T] {
        &self.lambda
    }

    pub fn lambda_mut(&mut self) -> &mut [T] {
        &mut self.lambda
    }

    pub fn fit(&self) -> f64 {
        self.fit
    }

    pub fn set_fit(&mut self, fit: f64) {
        self.fit = fit;
    }

    pub fn factors(&self) -> &[RankMatrix<T>] {
        &self.factors
    }

    pub fn factor(&self, mode: usize) -> KruskalResult<&RankMatrix<T>> {
        let nmodes = self.nmodes();
        self.factors
            .get(mode)
            .ok_or_else(|| CoreError::out_of_range(mode, nmodes).into())
    }

    pub fn factor_mut(&mut self, mode: usize) -> KruskalResult<&mut RankMatrix<T>> {
        let nmodes = self.nmodes();
        self.factors
            .get_mut(mode)
            .ok_or_else(|| CoreError::out_of_range(mode, nmodes).into())
    }

    /// See [`KruskalTensor::normalize`].
    pub fn normalize(&mut self) {
        for factor in &mut self.factors {
            let norms = factor.as_matrix_mut().normalize_columns();
            for (l, n) in self.lambda.iter_mut().zip(norms) {
                if n > T::zero() {
                    *l = *l * n;
                }
            }
        }
    }

    /// See [`KruskalTensor::entry`].
    pub fn entry(&self, coords: &[Index]) -> KruskalResult<T> {
        let rows = factor_rows(self.nmodes(), coords, |m, c| self.factors[m].row(c))?;
        Ok(evaluate(&self.lambda, &rows))
    }
}

fn check_shape(nmodes: usize, rank: usize, ndims: &[Index]) -> KruskalResult<()> {
    if ndims.len() != nmodes {
        return Err(KruskalError::ModeCountMismatch {
            expected: nmodes,
            got: ndims.len(),
        });
    }
    if rank == 0 {
        return Err(KruskalError::InvalidRank(rank));
    }
    Ok(())
}

fn factor_rows<'a, T: 'a>(
    nmodes: usize,
    coords: &[Index],
    row: impl Fn(usize, usize) -> sptensor_core::CoreResult<&'a [T]>,
) -> KruskalResult<Vec<&'a [T]>> {
    if coords.len() != nmodes {
        return Err(KruskalError::ModeCountMismatch {
            expected: nmodes,
            got: coords.len(),
        });
    }
    coords
        .iter()
        .enumerate()
        .map(|(m, &c)| row(m, to_usize(c)).map_err(KruskalError::from))
        .collect()
}

fn evaluate<T: Float>(lambda: &[T], rows: &[&[T]]) -> T {
    lambda.iter().enumerate().fold(T::zero(), |acc, (r, &l)| {
        acc + rows.iter().fold(l, |prod, row| prod * row[r])
    })
}
