//! # sptensor-core
//!
//! Core containers for the sptensor sparse tensor stack.
//!
//! This crate provides the building blocks every sparse format is made of:
//!
//! - **Index types** ([`Index`], [`ElementIndex`], [`BlockIndex`], [`NnzIndex`])
//!   sized for what each index family has to address
//! - **Growable vectors** ([`TypedVector`]) with doubling growth and
//!   fallible allocation
//! - **Dense matrices** ([`Matrix`]) with padded row strides, and the bounded
//!   [`RankMatrix`] for small CP ranks
//! - **Key-value pairs** ([`KeyValuePair`]) for permutation bookkeeping
//!
//! ## Quick Start
//!
//! ```
//! use sptensor_core::{Matrix, ValueVector};
//!
//! let mut values = ValueVector::<f64>::new();
//! values.append(1.0).unwrap();
//! values.append(2.0).unwrap();
//! assert_eq!(values.as_slice(), &[1.0, 2.0]);
//!
//! let factor = Matrix::<f64>::new(100, 10).unwrap();
//! assert_eq!(factor.stride(), 16);
//! ```
//!
//! ## Ownership
//!
//! Containers own their storage exclusively and carry no internal
//! synchronization; a single writer at a time is assumed. Parallel consumers
//! coordinate through `sptensor-exec`'s mutex pool.
//!
//! ## Error Handling
//!
//! Every bounds-checked accessor and every allocation returns
//! [`CoreResult`]:
//!
//! ```
//! use sptensor_core::{CoreError, IndexVector};
//!
//! let inds = IndexVector::from_vec(vec![1, 2, 3]);
//! assert!(matches!(inds.get(3), Err(CoreError::IndexOutOfRange { .. })));
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod kv;
pub mod matrix;
pub mod types;
pub mod vector;

#[cfg(test)]
mod property_tests;

pub use error::{CoreError, CoreResult};
pub use kv::{mode_order_by_size, sort_by_key, sort_by_value, KeyValuePair};
pub use matrix::{Matrix, MatrixLayout, RankIndex, RankMatrix, DEFAULT_ALIGNMENT, MAX_RANK};
pub use types::{
    to_usize, BlockCoords, BlockIndex, Coords, ElementIndex, Index, NnzIndex, MAX_SB_BITS,
};
pub use vector::{
    BlockIndexVector, ElementIndexVector, IndexVector, NnzIndexVector, TypedVector, ValueVector,
};
