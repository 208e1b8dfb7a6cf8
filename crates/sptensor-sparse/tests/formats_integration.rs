//! Integration tests chaining the sparse formats together

use anyhow::Result;
use sptensor_sparse::{
    BinHeader, HiCooConfig, HiCooGeneral, HiCooTensor, SemiSparseHiCoo, SparseTensor,
};
use std::io::Cursor;

fn tensor() -> Result<SparseTensor<f64>> {
    let coords = [
        vec![0, 0, 0],
        vec![1, 5, 2],
        vec![9, 9, 9],
        vec![10, 8, 9],
        vec![3, 14, 7],
    ];
    Ok(SparseTensor::from_coords(
        vec![16, 16, 16],
        &coords,
        &[1.0, 2.0, 3.0, 4.0, 5.0],
    )?)
}

#[test]
fn test_header_then_encode() -> Result<()> {
    // Header as a file writer lays it out: i32 magic, u64 index width, u64 value width
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&4u64.to_le_bytes());
    bytes.extend_from_slice(&8u64.to_le_bytes());

    let header = BinHeader::read_from(&mut Cursor::new(bytes))?;
    header.validate_widths()?;
    assert_eq!(header.idx_width as usize, std::mem::size_of::<u32>());

    let coo = tensor()?;
    let hicoo = HiCooTensor::with_config(&coo, &HiCooConfig::default().with_sb_bits(3))?;
    hicoo.validate()?;
    // Blocks (0,0,0), (0,1,0) and (1,1,1)
    assert_eq!(hicoo.num_blocks(), 3);
    assert_eq!(hicoo.to_coo()?.pairs_sorted(), coo.pairs_sorted());
    Ok(())
}

#[test]
fn test_partial_compression_keeps_plain_modes() -> Result<()> {
    let coo = tensor()?;
    let general = HiCooGeneral::from_coo(&coo, &[true, true, false], 3)?;
    general.validate()?;

    assert_eq!(general.ncmodes(), 2);
    assert!(general.binds(2)?.is_none());
    assert_eq!(general.to_coo()?.pairs_sorted(), coo.pairs_sorted());
    Ok(())
}

#[test]
fn test_semi_sparse_hicoo_from_coo() -> Result<()> {
    let coo = tensor()?;
    let blocked = SemiSparseHiCoo::from_coo(&coo, 2, 3)?;
    assert_eq!(blocked.nnz(), 5);
    assert_eq!(blocked.to_coo()?.pairs_sorted(), coo.pairs_sorted());
    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn test_config_serde_roundtrip() -> Result<()> {
    let config = HiCooConfig::default().with_sb_bits(4);
    let json = serde_json::to_string(&config)?;
    let back: HiCooConfig = serde_json::from_str(&json)?;
    assert_eq!(back, config);
    back.validate()?;

    let bad: HiCooConfig = serde_json::from_str(r#"{"sb_bits": 12}"#)?;
    assert!(bad.validate().is_err());
    Ok(())
}
