//! Binary tensor file header
//!
//! Binary tensor files start with a fixed 20-byte little-endian header:
//!
//! | offset | size | field       |
//! |--------|------|-------------|
//! | 0      | 4    | `magic` (i32) |
//! | 4      | 8    | `idx_width` (u64), bytes per stored index |
//! | 12     | 8    | `val_width` (u64), bytes per stored value |
//!
//! The header is only consumed here: it tells a reader how wide the index
//! and value records that follow are.
//!
//! # Examples
//!
//! ```rust
//! use sptensor_sparse::io::BinHeader;
//! use std::io::Cursor;
//!
//! let mut bytes = Vec::new();
//! bytes.extend_from_slice(&1i32.to_le_bytes());
//! bytes.extend_from_slice(&4u64.to_le_bytes());
//! bytes.extend_from_slice(&8u64.to_le_bytes());
//!
//! let header = BinHeader::read_from(&mut Cursor::new(bytes)).unwrap();
//! assert_eq!(header.idx_width, 4);
//! header.validate_widths().unwrap();
//! ```

use std::io::Read;

use crate::error::{SparseResult, ValidationError};

/// Size of the encoded header in bytes
pub const BIN_HEADER_LEN: usize = 20;

/// Fixed header of a binary tensor file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinHeader {
    pub magic: i32,
    /// Bytes per index record
    pub idx_width: u64,
    /// Bytes per value record
    pub val_width: u64,
}

impl BinHeader {
    /// Reads the 20-byte little-endian header.
    ///
    /// # Errors
    ///
    /// `SparseError::Io` if the reader ends early or fails.
    pub fn read_from<R: Read>(reader: &mut R) -> SparseResult<Self> {
        let mut buf = [0u8; BIN_HEADER_LEN];
        reader.read_exact(&mut buf)?;

        let mut magic = [0u8; 4];
        let mut idx_width = [0u8; 8];
        let mut val_width = [0u8; 8];
        magic.copy_from_slice(&buf[0..4]);
        idx_width.copy_from_slice(&buf[4..12]);
        val_width.copy_from_slice(&buf[12..20]);

        let header = Self {
            magic: i32::from_le_bytes(magic),
            idx_width: u64::from_le_bytes(idx_width),
            val_width: u64::from_le_bytes(val_width),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            magic = header.magic,
            idx_width = header.idx_width,
            val_width = header.val_width,
            "read binary tensor header"
        );
        Ok(header)
    }

    /// Checks that both widths are 4 or 8 bytes.
    pub fn validate_widths(&self) -> SparseResult<()> {
        for (name, width) in [("index", self.idx_width), ("value", self.val_width)] {
            if width != 4 && width != 8 {
                return Err(ValidationError::InvalidHeader {
                    reason: format!("{} width must be 4 or 8 bytes, got {}", name, width),
                }
                .into());
            }
        }
        Ok(())
    }
}
