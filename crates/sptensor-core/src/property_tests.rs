//! Property-based tests for the core containers
//!
//! These tests use proptest to check layout and growth invariants across
//! randomly generated sizes.

#[cfg(test)]
mod tests {
    use crate::{Matrix, MatrixLayout, TypedVector, DEFAULT_ALIGNMENT};
    use proptest::prelude::*;

    proptest! {
        /// Property: stride >= ncols and stride is a multiple of 8
        #[test]
        fn prop_stride_invariant(nrows in 0usize..20, ncols in 0usize..300) {
            let m = Matrix::<f64>::new(nrows, ncols).unwrap();
            prop_assert!(m.stride() >= ncols);
            prop_assert_eq!(m.stride() % DEFAULT_ALIGNMENT, 0);
            prop_assert_eq!(m.as_slice().len(), m.capacity() * m.stride());
        }

        /// Property: any positive alignment unit yields the smallest padded stride
        #[test]
        fn prop_stride_is_smallest_multiple(ncols in 0usize..300, alignment in 1usize..64) {
            let layout = MatrixLayout::new(alignment).unwrap();
            let m = Matrix::<f32>::with_layout(1, ncols, layout).unwrap();
            prop_assert_eq!(m.stride() % alignment, 0);
            prop_assert!(m.stride() >= ncols);
            prop_assert!(m.stride() < ncols + alignment);
        }

        /// Property: n appends give len = n, cap >= n and O(log n) reallocations
        #[test]
        fn prop_vector_growth(n in 0usize..5000) {
            let mut vec = TypedVector::<u32>::new();
            for i in 0..n {
                vec.append(i as u32).unwrap();
            }
            prop_assert_eq!(vec.len(), n);
            prop_assert!(vec.capacity() >= n);

            let bound = if n == 0 { 0 } else { (n as f64).log2().floor() as usize + 1 };
            prop_assert!(vec.reallocations() <= bound);
        }

        /// Property: resizing rows keeps surviving rows intact
        #[test]
        fn prop_resize_rows_keeps_prefix(nrows in 1usize..16, grow in 0usize..32, ncols in 1usize..12) {
            let rows: Vec<Vec<f64>> = (0..nrows)
                .map(|r| (0..ncols).map(|c| (r * ncols + c) as f64).collect())
                .collect();
            let mut m = Matrix::from_rows(&rows).unwrap();
            m.resize_rows(nrows + grow).unwrap();
            for (r, row) in rows.iter().enumerate() {
                prop_assert_eq!(m.row(r).unwrap(), row.as_slice());
            }
        }
    }
}
