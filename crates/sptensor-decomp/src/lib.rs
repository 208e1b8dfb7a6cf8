//! # sptensor-decomp - Decomposition Result Containers
//!
//! Storage for the output of CP (Canonical Polyadic) decompositions of
//! sparse tensors.
//!
//! ## Overview
//!
//! A CP decomposition factorizes a tensor into a sum of rank-1 components:
//!
//! ```text
//! X ≈ Σᵣ λᵣ (a₁ᵣ ⊗ a₂ᵣ ⊗ ... ⊗ aₙᵣ)
//! ```
//!
//! This crate owns the result, not the algorithm:
//!
//! - [`KruskalTensor`]: one dense factor matrix per mode, component weights
//!   `lambda` and the `fit` reported by the driver
//! - [`RankKruskalTensor`]: the same with factors stored as
//!   [`sptensor_core::RankMatrix`], limiting the rank to 256
//!
//! ## Quick Start
//!
//! ```
//! use sptensor_decomp::KruskalTensor;
//!
//! let mut kt = KruskalTensor::<f64>::new(3, 2, &[4, 5, 6]).unwrap();
//! kt.factor_mut(0).unwrap().fill(1.0);
//! kt.factor_mut(1).unwrap().fill(1.0);
//! kt.factor_mut(2).unwrap().fill(0.5);
//!
//! // Two unit-weight components, each contributing 1 × 1 × 0.5
//! assert_eq!(kt.entry(&[3, 4, 5]).unwrap(), 1.0);
//! ```

pub mod error;
pub mod kruskal;

#[cfg(test)]
mod property_tests;

pub use error::{KruskalError, KruskalResult};
pub use kruskal::{KruskalTensor, RankKruskalTensor};
