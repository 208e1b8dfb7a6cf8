//! HiCOO workflow: build a COO tensor, compress it, inspect blocks and decode
//!
//! Run with:
//! ```text
//! RUST_LOG=sptensor_sparse=debug cargo run --example hicoo_workflow
//! ```

use anyhow::Result;
use sptensor::prelude::*;
use sptensor::tracing_support::{init_tracing, TracingConfig};

fn main() -> Result<()> {
    init_tracing(TracingConfig::default())?;

    println!("=== HiCOO Workflow ===\n");

    // 1. A 3-mode tensor with two dense clusters
    let mut coo = SparseTensor::<f64>::new(vec![256, 256, 256])?;
    for i in 0..16u32 {
        for j in 0..16u32 {
            coo.push(&[i, j, (i * j) % 16], (i + j) as f64 + 1.0)?;
            coo.push(&[200 + i % 8, 128 + j, 64 + i], 0.5)?;
        }
    }
    println!("COO: {} nonzeros, density {:.2e}", coo.nnz(), coo.density());

    // 2. Compress with 16-wide blocks
    let config = HiCooConfig::default().with_sb_bits(4);
    config.validate()?;
    let hicoo = HiCooTensor::with_config(&coo, &config)?;
    println!(
        "HiCOO: {} blocks of size {} ({} bytes vs {} bytes in COO)",
        hicoo.num_blocks(),
        hicoo.block_size(),
        hicoo.storage_bytes(),
        coo.storage_bytes()
    );

    let stats = FormatStats::compare(&coo, &hicoo);
    println!(
        "Index compression {:.2}x, {:.1} nonzeros per block\n",
        stats.compression_ratio(),
        stats.avg_nnz_per_block()
    );

    // 3. Walk the blocks
    for block in hicoo.blocks().take(4) {
        println!(
            "block {}: coords {:?}, {} nonzeros",
            block.index(),
            block.block_coords().as_slice(),
            block.nnz()
        );
    }

    // 4. Decode and check nothing was lost
    let decoded = hicoo.to_coo()?;
    anyhow::ensure!(
        decoded.pairs_sorted() == coo.pairs_sorted(),
        "decoded tensor differs from input"
    );
    println!("\nDecoded {} nonzeros, sort order {:?}", decoded.nnz(), decoded.sortorder());

    // 5. Semi-sparse view with mode 2 dense, then blocked
    let semi = SemiSparseTensor::from_coo(&coo, 2)?;
    let blocked = SemiSparseHiCoo::from_semi_sparse(&semi, 4)?;
    println!(
        "Semi-sparse: {} fibers of length {}, {} blocks after HiCOO",
        semi.nnz(),
        coo.ndims()[2],
        blocked.num_blocks()
    );

    // 6. A pool guarding factor-row updates
    let pool = MutexPool::with_config(MutexPoolConfig::default().with_nlocks(64))?;
    let mut kt = KruskalTensor::<f64>::new(3, 4, coo.ndims())?;
    for (coords, value) in hicoo.iter() {
        let row = coords[0] as usize;
        let guard = pool.acquire(row)?;
        kt.factor_mut(0)?.row_mut(row)?[0] += value;
        guard.release();
    }
    println!("Factor 0 row 0 after scatter: {:?}", kt.factor(0)?.row(0)?);

    Ok(())
}
