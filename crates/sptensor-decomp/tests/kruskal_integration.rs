//! Integration tests for Kruskal tensors used the way a CP driver uses them

use anyhow::Result;
use sptensor_core::Matrix;
use sptensor_decomp::{KruskalTensor, RankKruskalTensor};

#[test]
fn test_driver_populates_result() -> Result<()> {
    let ndims = [3u32, 4, 2];
    let rank = 2;
    let mut kt = KruskalTensor::<f64>::new(3, rank, &ndims)?;

    // A driver writes whole factor matrices, then weights and fit
    for m in 0..3 {
        let rows: Vec<Vec<f64>> = (0..ndims[m] as usize)
            .map(|i| (0..rank).map(|r| (i + r + m) as f64).collect())
            .collect();
        let source = Matrix::from_rows(&rows)?;
        let factor = kt.factor_mut(m)?;
        for i in 0..source.nrows() {
            factor.row_mut(i)?.copy_from_slice(source.row(i)?);
        }
    }
    kt.lambda_mut().copy_from_slice(&[0.5, 2.0]);
    kt.set_fit(0.87);

    // Component 0: 0.5 * (2 * 4 * 3); component 1: 2.0 * (3 * 5 * 4)
    assert_eq!(kt.entry(&[2, 3, 1])?, 0.5 * 24.0 + 2.0 * 60.0);
    assert_eq!(kt.fit(), 0.87);
    Ok(())
}

#[test]
fn test_factor_rows_can_grow() -> Result<()> {
    let mut kt = RankKruskalTensor::<f32>::new(2, 8, &[4, 4])?;
    kt.factor_mut(0)?.row_mut(3)?.fill(1.5);

    kt.factor_mut(0)?.resize_rows(10)?;
    let factor = kt.factor(0)?;
    assert_eq!(factor.nrows(), 10);
    assert_eq!(factor.row(3)?, &[1.5; 8]);
    assert_eq!(factor.row(9)?, &[0.0; 8]);
    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn test_result_serde_roundtrip() -> Result<()> {
    let mut kt = KruskalTensor::<f64>::new(2, 3, &[4, 5])?;
    kt.factor_mut(1)?.fill(0.25);
    kt.set_fit(0.5);

    let json = serde_json::to_string(&kt)?;
    let back: KruskalTensor<f64> = serde_json::from_str(&json)?;
    assert_eq!(back, kt);
    Ok(())
}
