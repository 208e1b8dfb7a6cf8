//! Integration tests for sptensor-core
//!
//! These tests exercise the public containers together, the way the sparse
//! formats built on top of them do.

use sptensor_core::{
    mode_order_by_size, BlockIndexVector, CoreError, ElementIndexVector, Matrix, NnzIndexVector,
    RankMatrix, ValueVector, MAX_SB_BITS,
};

#[test]
fn test_block_arrays_built_with_vectors() {
    // Three nonzeros in two blocks of size 4
    let coords = [1u32, 3, 5];
    let sb_bits = 2;

    let mut bptr = NnzIndexVector::new();
    let mut binds = BlockIndexVector::new();
    let mut einds = ElementIndexVector::new();

    bptr.append(0).unwrap();
    let mut current = None;
    for (i, &c) in coords.iter().enumerate() {
        let block = c >> sb_bits;
        if current != Some(block) {
            if current.is_some() {
                bptr.append(i).unwrap();
            }
            binds.append(block).unwrap();
            current = Some(block);
        }
        einds.append((c & ((1 << sb_bits) - 1)) as u8).unwrap();
    }
    bptr.append(coords.len()).unwrap();

    assert_eq!(bptr.as_slice(), &[0, 2, 3]);
    assert_eq!(binds.as_slice(), &[0, 1]);
    assert_eq!(einds.as_slice(), &[1, 3, 1]);
    assert!(sb_bits <= MAX_SB_BITS);
}

#[test]
fn test_factor_matrix_scatter_rows() {
    let mut factor = Matrix::<f64>::new(4, 3).unwrap();
    let mut acc = ValueVector::<f64>::new();

    for r in 0..4 {
        let row = factor.row_mut(r).unwrap();
        for (c, v) in row.iter_mut().enumerate() {
            *v = (r + c) as f64;
        }
        acc.append(row.iter().sum()).unwrap();
    }

    assert_eq!(acc.as_slice(), &[3.0, 6.0, 9.0, 12.0]);
    assert_eq!(factor.get(3, 2).unwrap(), 5.0);
}

#[test]
fn test_rank_matrix_rejects_large_rank() {
    assert!(RankMatrix::<f32>::new(8, 16).is_ok());
    assert!(matches!(
        RankMatrix::<f32>::new(8, 1024),
        Err(CoreError::RankTooLarge { rank: 1024, .. })
    ));
}

#[test]
fn test_mode_order_by_size() {
    let order = mode_order_by_size(&[1000, 10, 100], 0);
    assert_eq!(order, vec![0, 1, 2]);

    let order = mode_order_by_size(&[1000, 10, 100], 1);
    assert_eq!(order, vec![1, 2, 0]);
}

#[cfg(feature = "serde")]
mod serde_roundtrip {
    use sptensor_core::{IndexVector, KeyValuePair, Matrix, MatrixLayout};

    #[test]
    fn test_layout_and_pairs_roundtrip() {
        let layout = MatrixLayout::new(16).unwrap();
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(serde_json::from_str::<MatrixLayout>(&json).unwrap(), layout);

        let pairs = vec![KeyValuePair::new(3, 1), KeyValuePair::new(0, 2)];
        let json = serde_json::to_string(&pairs).unwrap();
        assert_eq!(serde_json::from_str::<Vec<KeyValuePair>>(&json).unwrap(), pairs);
    }

    #[test]
    fn test_vector_roundtrip_drops_growth_count() {
        let mut inds = IndexVector::new();
        for i in 0..9 {
            inds.append(i).unwrap();
        }
        assert!(inds.reallocations() > 0);

        let json = serde_json::to_string(&inds).unwrap();
        let back: IndexVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inds);
        assert_eq!(back.reallocations(), 0);
    }

    #[test]
    fn test_matrix_roundtrip_keeps_padding() {
        let m = Matrix::<f64>::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: Matrix<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stride(), 8);
        assert_eq!(back.row(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(back, m);
    }
}
