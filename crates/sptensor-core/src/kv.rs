//! Key-value pairs for permutation bookkeeping

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::Index;

/// Sortable `(key, value)` pair of indices.
///
/// Ordering compares `key` first, then `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyValuePair {
    pub key: Index,
    pub value: Index,
}

impl KeyValuePair {
    #[inline]
    pub fn new(key: Index, value: Index) -> Self {
        Self { key, value }
    }
}

/// Stable sort by key only.
pub fn sort_by_key(pairs: &mut [KeyValuePair]) {
    pairs.sort_by_key(|kv| kv.key);
}

/// Stable sort by value only.
pub fn sort_by_value(pairs: &mut [KeyValuePair]) {
    pairs.sort_by_key(|kv| kv.value);
}

/// Mode ordering with `lead` first and the other modes by ascending size.
///
/// Ties keep the natural mode order. Useful as a COO sort order: putting
/// short modes early groups nonzeros into fewer, denser blocks.
///
/// # Examples
///
/// ```
/// use sptensor_core::mode_order_by_size;
///
/// assert_eq!(mode_order_by_size(&[100, 5, 40, 5], 2), vec![2, 1, 3, 0]);
/// ```
pub fn mode_order_by_size(ndims: &[Index], lead: usize) -> Vec<usize> {
    let mut pairs: Vec<KeyValuePair> = ndims
        .iter()
        .enumerate()
        .filter(|&(m, _)| m != lead)
        .map(|(m, &dim)| KeyValuePair::new(dim, m as Index))
        .collect();
    sort_by_key(&mut pairs);

    let mut order = Vec::with_capacity(ndims.len());
    if lead < ndims.len() {
        order.push(lead);
    }
    order.extend(pairs.iter().map(|kv| kv.value as usize));
    order
}
