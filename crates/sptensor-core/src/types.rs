//! Scalar index types shared by every sptensor storage format.
//!
//! Sparse tensor formats store a lot of indices, so the width of each index
//! family is chosen for what it has to address:
//!
//! - [`Index`]: a full coordinate along one mode
//! - [`BlockIndex`]: a block coordinate (`index >> sb_bits`) in HiCOO
//! - [`ElementIndex`]: an offset inside a block (`index & (2^sb_bits - 1)`)
//! - [`NnzIndex`]: a position in the nonzero arrays
//!
//! # Examples
//!
//! ```
//! use sptensor_core::{ElementIndex, Index, MAX_SB_BITS};
//!
//! let coord: Index = 1_000;
//! let sb_bits = 3;
//! let offset = (coord & ((1 << sb_bits) - 1)) as ElementIndex;
//! assert_eq!(offset, 0);
//! assert_eq!(MAX_SB_BITS, 8);
//! ```

use smallvec::SmallVec;

/// Full-width coordinate along a single mode.
pub type Index = u32;

/// Narrow offset of a nonzero inside its HiCOO block.
pub type ElementIndex = u8;

/// Block coordinate of a HiCOO block along a single mode.
pub type BlockIndex = u32;

/// Position of a nonzero (and entries of block pointer arrays).
pub type NnzIndex = usize;

/// Largest `sb_bits` whose in-block offsets still fit in [`ElementIndex`].
pub const MAX_SB_BITS: u32 = ElementIndex::BITS;

/// Coordinate tuple of a single nonzero.
///
/// Inline for up to 6 modes, which covers almost every tensor met in
/// practice; higher orders spill to the heap.
pub type Coords = SmallVec<[Index; 6]>;

/// Block coordinate tuple of a single HiCOO block.
pub type BlockCoords = SmallVec<[BlockIndex; 6]>;

/// Converts a coordinate to a `usize` position.
#[inline]
pub fn to_usize(index: Index) -> usize {
    index as usize
}
