//! Property-based tests for Kruskal tensors
//!
//! These tests use proptest to verify properties that must hold for any
//! shape, rank and factor content.

#[cfg(test)]
mod tests {
    use crate::{KruskalError, KruskalTensor, RankKruskalTensor};
    use proptest::prelude::*;
    use sptensor_core::MAX_RANK;

    fn proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        }
    }

    /// Fill every factor entry from a deterministic sequence
    fn fill_factors(kt: &mut KruskalTensor<f64>, seed: u64) {
        let mut state = seed;
        for m in 0..kt.nmodes() {
            let factor = kt.factor_mut(m).unwrap();
            for r in 0..factor.nrows() {
                for v in factor.row_mut(r).unwrap() {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    *v = ((state >> 40) % 1000) as f64 / 250.0 - 2.0;
                }
            }
        }
    }

    // Property: factors have one row per mode index and `rank` columns
    proptest! {
        #![proptest_config(proptest_config())]
        #[test]
        fn kruskal_factor_shapes(
            ndims in prop::collection::vec(1u32..40, 1..5),
            rank in 1usize..20,
        ) {
            let kt = KruskalTensor::<f64>::new(ndims.len(), rank, &ndims).unwrap();
            prop_assert_eq!(kt.lambda().len(), rank);
            prop_assert_eq!(kt.fit(), 0.0);
            for (factor, &d) in kt.factors().iter().zip(&ndims) {
                prop_assert_eq!(factor.nrows(), d as usize);
                prop_assert_eq!(factor.ncols(), rank);
                prop_assert!(factor.stride() >= rank);
                prop_assert_eq!(factor.stride() % 8, 0);
            }
        }
    }

    // Property: normalizing does not change the represented tensor
    proptest! {
        #![proptest_config(proptest_config())]
        #[test]
        fn normalize_preserves_entries(
            ndims in prop::collection::vec(1u32..6, 2..4),
            rank in 1usize..6,
            seed in any::<u64>(),
        ) {
            let mut kt = KruskalTensor::<f64>::new(ndims.len(), rank, &ndims).unwrap();
            fill_factors(&mut kt, seed);
            let coords: Vec<u32> = ndims.iter().map(|&d| d - 1).collect();
            let before = kt.entry(&coords).unwrap();

            kt.normalize();
            let after = kt.entry(&coords).unwrap();
            prop_assert!((before - after).abs() <= 1e-9 * before.abs().max(1.0));
        }
    }

    // Property: the bounded variant accepts exactly ranks up to 256
    proptest! {
        #![proptest_config(proptest_config())]
        #[test]
        fn rank_kruskal_bound(rank in 1usize..600) {
            let result = RankKruskalTensor::<f32>::new(2, rank, &[3, 3]);
            if rank <= MAX_RANK {
                prop_assert!(result.is_ok());
            } else {
                let is_rank_error = matches!(result, Err(KruskalError::RankTooLarge { .. }));
                prop_assert!(is_rank_error);
            }
        }
    }
}
