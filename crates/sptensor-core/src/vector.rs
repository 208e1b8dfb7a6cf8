//! Growable typed vectors
//!
//! [`TypedVector`] is the building block of every sparse format in the stack:
//! per-mode index arrays, block pointers and value arrays are all typed vectors.
//! Growth is explicit and geometric (capacity doubles when full) so that `n`
//! appends cost `O(n)` amortized and at most `O(log n)` reallocations, and an
//! allocation failure is reported as [`CoreError::AllocationFailure`] instead
//! of aborting the process.
//!
//! # Examples
//!
//! ```
//! use sptensor_core::{IndexVector, TypedVector};
//!
//! let mut inds = IndexVector::new();
//! for i in 0..10 {
//!     inds.append(i).unwrap();
//! }
//! assert_eq!(inds.len(), 10);
//! assert!(inds.capacity() >= 10);
//! assert_eq!(*inds.get(3).unwrap(), 3);
//! assert!(inds.get(10).is_err());
//! ```

use std::ops::Deref;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{BlockIndex, ElementIndex, Index, NnzIndex};

/// Capacity used for the first allocation of an empty vector.
const MIN_CAPACITY: usize = 2;

/// Resizable sequence of a single scalar type with doubling growth.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypedVector<T> {
    data: Vec<T>,
    /// Number of times the backing storage grew
    #[cfg_attr(feature = "serde", serde(skip))]
    reallocations: usize,
}

/// Vector of nonzero values.
pub type ValueVector<T> = TypedVector<T>;
/// Vector of full-width coordinates.
pub type IndexVector = TypedVector<Index>;
/// Vector of in-block element offsets.
pub type ElementIndexVector = TypedVector<ElementIndex>;
/// Vector of block coordinates.
pub type BlockIndexVector = TypedVector<BlockIndex>;
/// Vector of nonzero positions (block pointers).
pub type NnzIndexVector = TypedVector<NnzIndex>;

impl<T> TypedVector<T> {
    /// Creates an empty vector without allocating.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            reallocations: 0,
        }
    }

    /// Creates an empty vector able to hold `capacity` elements.
    pub fn with_capacity(capacity: usize) -> CoreResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| CoreError::AllocationFailure {
                requested: capacity,
            })?;
        Ok(Self {
            data,
            reallocations: 0,
        })
    }

    /// Wraps an existing vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data,
            reallocations: 0,
        }
    }

    /// Number of stored elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the vector holds no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements the vector can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Number of times the storage has grown since construction.
    #[inline]
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Appends `value`, doubling the capacity when the vector is full.
    ///
    /// Existing elements keep their order.
    pub fn append(&mut self, value: T) -> CoreResult<()> {
        if self.data.len() == self.data.capacity() {
            let target = (self.data.capacity() * 2).max(MIN_CAPACITY);
            self.grow_to(target)?;
        }
        self.data.push(value);
        Ok(())
    }

    /// Bounds-checked read access.
    pub fn get(&self, index: usize) -> CoreResult<&T> {
        self.data
            .get(index)
            .ok_or_else(|| CoreError::out_of_range(index, self.data.len()))
    }

    /// Bounds-checked mutable access.
    pub fn get_mut(&mut self, index: usize) -> CoreResult<&mut T> {
        let len = self.data.len();
        self.data
            .get_mut(index)
            .ok_or_else(|| CoreError::out_of_range(index, len))
    }

    /// Bounds-checked write.
    pub fn set(&mut self, index: usize, value: T) -> CoreResult<()> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// Shortens the vector, keeping the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Removes every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns the elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the vector and returns its storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn grow_to(&mut self, capacity: usize) -> CoreResult<()> {
        let additional = capacity.saturating_sub(self.data.len());
        self.data
            .try_reserve_exact(additional)
            .map_err(|_| CoreError::AllocationFailure {
                requested: capacity,
            })?;
        self.reallocations += 1;
        Ok(())
    }
}

impl<T: Clone> TypedVector<T> {
    /// Creates a vector of `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> CoreResult<Self> {
        let mut vec = Self::with_capacity(len)?;
        vec.data.resize(len, value);
        Ok(vec)
    }

    /// Appends every element of `values`, growing geometrically as needed.
    pub fn append_slice(&mut self, values: &[T]) -> CoreResult<()> {
        let needed = self.data.len() + values.len();
        if needed > self.data.capacity() {
            let mut target = (self.data.capacity() * 2).max(MIN_CAPACITY);
            while target < needed {
                target *= 2;
            }
            self.grow_to(target)?;
        }
        self.data.extend_from_slice(values);
        Ok(())
    }

    /// Resizes to `len` elements, filling new slots with `value`.
    pub fn resize(&mut self, len: usize, value: T) -> CoreResult<()> {
        if len > self.data.capacity() {
            self.grow_to(len)?;
        }
        self.data.resize(len, value);
        Ok(())
    }
}

impl<T> Deref for TypedVector<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T: PartialEq> PartialEq for TypedVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T> From<Vec<T>> for TypedVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> FromIterator<T> for TypedVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a TypedVector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
